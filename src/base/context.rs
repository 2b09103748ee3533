//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO and TLS errors into context-rich `NetError` variants.

use crate::base::neterror::NetError;
use std::fmt::Display;
use std::io;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use decoynet::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr).await
    ///     .connection_context("203.0.113.7", 443)?;
    /// // Error: "Connection to 203.0.113.7:443 failed: connection refused"
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| NetError::connection_failed_to(host, port, e))
    }
}

/// Extension trait for TLS handshake results.
///
/// Handshake errors from BoringSSL are not `io::Error`s and carry the
/// underlying stream type, so only their rendered message is kept.
pub trait HandshakeResultExt<T> {
    fn handshake_context(self, addr: &str) -> Result<T, NetError>;
}

impl<T, E: Display> HandshakeResultExt<T> for Result<T, E> {
    fn handshake_context(self, addr: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::SslHandshakeFailed {
            addr: addr.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Extension trait for DoH exchanges.
///
/// Whatever goes wrong between us and the endpoint, the caller sees a
/// resolution failure naming the server.
pub trait DohResultExt<T> {
    fn doh_context(self, server: &str, step: &str) -> Result<T, NetError>;
}

impl<T, E: Display> DohResultExt<T> for Result<T, E> {
    fn doh_context(self, server: &str, step: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::DohResponseInvalid {
            server: server.to_string(),
            reason: format!("{step}: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_connection_context() {
        let result: Result<(), io::Error> =
            Err(Error::new(ErrorKind::ConnectionRefused, "refused"));
        let err = result.connection_context("192.0.2.1", 443).unwrap_err();

        match err {
            NetError::ConnectionFailedTo { host, port, .. } => {
                assert_eq!(host, "192.0.2.1");
                assert_eq!(port, 443);
            }
            _ => panic!("Expected ConnectionFailedTo"),
        }
    }

    #[test]
    fn test_doh_context() {
        let result: Result<(), io::Error> =
            Err(Error::new(ErrorKind::ConnectionRefused, "refused"));
        let err = result
            .doh_context("https://doh.example/dns-query", "connect")
            .unwrap_err();

        assert!(err.is_resolution_error());
        match err {
            NetError::DohResponseInvalid { server, reason } => {
                assert_eq!(server, "https://doh.example/dns-query");
                assert!(reason.starts_with("connect: "));
            }
            _ => panic!("Expected DohResponseInvalid"),
        }
    }

    #[test]
    fn test_handshake_context() {
        let result: Result<(), String> = Err("alert handshake failure".to_string());
        let err = result.handshake_context("192.0.2.1:443").unwrap_err();

        match err {
            NetError::SslHandshakeFailed { addr, reason } => {
                assert_eq!(addr, "192.0.2.1:443");
                assert!(reason.contains("handshake failure"));
            }
            _ => panic!("Expected SslHandshakeFailed"),
        }
    }
}
