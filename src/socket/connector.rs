//! Pluggable transport factory.
//!
//! An attempt asks a [`Connect`] implementation for a socket to one
//! candidate. The default, [`DecoySniConnector`], opens a decoy-SNI TLS
//! stream; tests and alternative transports supply their own.

use crate::base::deadline::Deadline;
use crate::base::neterror::NetError;
use crate::socket::decoy::{self, DEFAULT_DECOY_SNI};
use crate::socket::stream::BoxedSocket;
use crate::socket::tls::{TlsConfig, TlsConnector};
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;

/// Everything a connector needs to reach one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub addr: IpAddr,
    pub port: u16,
    /// True host, carried in `Host` once connected.
    pub hostname: String,
    /// Server name for the ClientHello.
    pub decoy_sni: String,
}

impl ConnectTarget {
    pub fn new(addr: IpAddr, port: u16, hostname: impl Into<String>) -> Self {
        Self {
            addr,
            port,
            hostname: hostname.into(),
            decoy_sni: DEFAULT_DECOY_SNI.to_string(),
        }
    }

    pub fn with_decoy_sni(mut self, decoy_sni: impl Into<String>) -> Self {
        self.decoy_sni = decoy_sni.into();
        self
    }
}

/// Alias for the `Future` type returned by a connector.
pub type Connecting<'a> = Pin<Box<dyn Future<Output = Result<BoxedSocket, NetError>> + Send + 'a>>;

/// Opens a transport to one candidate address.
///
/// Implementations must bound every suspension point with `deadline`.
pub trait Connect: Send + Sync {
    fn connect<'a>(&'a self, target: &'a ConnectTarget, deadline: &'a Deadline) -> Connecting<'a>;
}

/// The production connector: TCP plus a decoy-SNI TLS handshake.
///
/// The BoringSSL connector is built once here and shared by every attempt.
/// A config BoringSSL rejects surfaces as the error of each connect.
#[derive(Debug, Clone)]
pub struct DecoySniConnector {
    tls: TlsConfig,
    connector: Result<TlsConnector, NetError>,
}

impl Default for DecoySniConnector {
    fn default() -> Self {
        Self::new(TlsConfig::default())
    }
}

impl DecoySniConnector {
    pub fn new(tls: TlsConfig) -> Self {
        let connector = TlsConnector::new(&tls);
        if let Err(e) = &connector {
            tracing::warn!(error = %e, "TLS configuration rejected");
        }
        Self { tls, connector }
    }

    pub fn tls_config(&self) -> &TlsConfig {
        &self.tls
    }
}

impl Connect for DecoySniConnector {
    fn connect<'a>(&'a self, target: &'a ConnectTarget, deadline: &'a Deadline) -> Connecting<'a> {
        Box::pin(async move {
            let tls = self.connector.as_ref().map_err(Clone::clone)?;
            let stream = decoy::open(
                target.addr,
                target.port,
                &target.hostname,
                Some(&target.decoy_sni),
                tls,
                deadline,
            )
            .await?;
            Ok(BoxedSocket::new(stream))
        })
    }
}
