//! # decoynet
//!
//! HTTPS fetching that keeps the real hostname out of the TLS ClientHello.
//!
//! Each connection presents a decoy server name during the handshake while
//! the HTTP request inside the tunnel carries the true `Host`. Because DNS
//! for the real host may be blocked or poisoned, a fetch works from a set
//! of candidate addresses (explicit, resolved over plain DNS or DoH, or
//! served from a caller-owned cache) and races or walks through them under
//! one shared deadline.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use decoynet::{FetchConfig, RequestSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), decoynet::NetError> {
//!     let config = FetchConfig::builder()
//!         .candidate_strs(["210.140.92.140"])?
//!         .build();
//!     let response = config
//!         .fetch(RequestSpec::get("https://i.pximg.net/")?)
//!         .await?;
//!     println!("Status: {}", response.status_code());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Errors, load states and the shared deadline
//! - [`dns`] - Candidate resolution: plain DNS, DoH, caller-owned cache
//! - [`socket`] - Decoy-SNI TLS transport and per-candidate attempts
//! - [`http`] - HTTP/1.0 request building and response parsing
//! - [`client`] - Race and sequential orchestration
//!
//! ## Security
//!
//! The decoy transport does not verify the server certificate: the
//! certificate matches neither the decoy nor, necessarily, anything the
//! client can check. Traffic is encrypted but the peer is not
//! authenticated. DoH lookups are verified normally.

pub mod base;
pub mod client;
pub mod dns;
pub mod http;
pub mod socket;

pub use base::neterror::{AttemptError, NetError};
pub use client::{fetch, fetch_via, FetchConfig, FetchConfigBuilder, FetchMode};
pub use http::{HttpResponse, RequestSpec};
