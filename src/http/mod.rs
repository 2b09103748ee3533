//! Minimal HTTP/1.0 engine for decoy-SNI transports.
//!
//! - [`request`]: what to fetch
//! - [`headers`]: ordered, case-preserving request headers
//! - [`transaction`]: request serialization and the read-to-EOF exchange
//! - [`response`]: binary-safe response parsing

pub mod headers;
pub mod request;
pub mod response;
pub mod transaction;

// Re-exports for convenience
pub use headers::RequestHeaders;
pub use request::RequestSpec;
pub use response::HttpResponse;
