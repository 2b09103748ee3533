//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): network error codes matching `net_error_list.h`
//! - [`LoadState`](loadstate::LoadState): attempt stages from `load_states_list.h`
//! - [`Deadline`](deadline::Deadline): the shared per-fetch timeout and cancellation point

pub mod context;
pub mod deadline;
pub mod loadstate;
pub mod neterror;
