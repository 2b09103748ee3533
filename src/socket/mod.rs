//! Transports and per-candidate attempts, mirroring Chromium's `net/socket/`:
//! - [`decoy`]: TCP + TLS handshake presenting a decoy server name
//! - [`connector`]: pluggable transport factory
//! - [`connectjob`]: one attempt, connect through response
//! - [`tls`]: TLS configuration with BoringSSL

pub mod connectjob;
pub mod connector;
pub mod decoy;
pub mod stream;
pub mod tls;

pub use connector::{Connect, ConnectTarget, Connecting, DecoySniConnector};
pub use decoy::{DecoySniStream, DEFAULT_DECOY_SNI};
pub use stream::{BoxedSocket, StreamSocket};
pub use tls::{TlsConfig, TlsConnector};
