//! Decoy-SNI TLS transport.
//!
//! Opens TCP to a literal candidate address and performs a TLS handshake
//! whose ClientHello names a decoy host instead of the one actually being
//! fetched. Once the handshake completes the stream is re-labelled with the
//! true hostname, which is what the HTTP layer sends in `Host`.

use crate::base::context::{HandshakeResultExt, IoResultExt};
use crate::base::deadline::Deadline;
use crate::base::neterror::NetError;
use crate::socket::stream::StreamSocket;
use crate::socket::tls::TlsConnector;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_boring::SslStream;

/// Server name placed in the ClientHello when the caller names none.
pub const DEFAULT_DECOY_SNI: &str = "www.apple.com.cn";

/// An established decoy-SNI TLS connection.
///
/// Owns its TCP socket exclusively; dropping the stream closes it.
#[derive(Debug)]
pub struct DecoySniStream {
    inner: SslStream<TcpStream>,
    peer: SocketAddr,
    /// Name the ClientHello carried.
    server_name: String,
    /// Logical host of the request, set after the handshake.
    hostname: String,
}

impl DecoySniStream {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// ALPN protocol the server picked, if any.
    pub fn negotiated_protocol(&self) -> Option<&[u8]> {
        self.inner.ssl().selected_alpn_protocol()
    }

    /// Sends close_notify and shuts the write half down.
    pub async fn close(&mut self) -> Result<(), NetError> {
        self.inner.shutdown().await.map_err(NetError::from)
    }
}

/// Connects to `addr:port` and completes a handshake presenting `decoy`
/// (or [`DEFAULT_DECOY_SNI`]) as the server name.
///
/// Both the TCP connect and the handshake are bounded by `deadline`.
/// Certificate checks follow the connector's `verify_peer`; the decoy
/// configuration leaves them off since the certificate belongs to
/// `hostname`, not the name that was sent.
pub async fn open(
    addr: IpAddr,
    port: u16,
    hostname: &str,
    decoy: Option<&str>,
    tls: &TlsConnector,
    deadline: &Deadline,
) -> Result<DecoySniStream, NetError> {
    let peer = SocketAddr::new(addr, port);
    let server_name = decoy.unwrap_or(DEFAULT_DECOY_SNI);

    tracing::debug!(peer = %peer, sni = %server_name, "opening decoy-SNI connection");

    let tcp = deadline
        .observe(TcpStream::connect(peer))
        .await?
        .connection_context(&addr.to_string(), port)?;
    if let Err(e) = tcp.set_nodelay(true) {
        tracing::debug!(peer = %peer, error = %e, "failed to set TCP_NODELAY");
    }

    let config = tls.configure(server_name)?;
    let inner = deadline
        .observe(tokio_boring::connect(config, server_name, tcp))
        .await?
        .handshake_context(&peer.to_string())?;

    tracing::debug!(peer = %peer, host = %hostname, "decoy handshake complete");

    Ok(DecoySniStream {
        inner,
        peer,
        server_name: server_name.to_string(),
        hostname: hostname.to_string(),
    })
}

impl StreamSocket for DecoySniStream {
    fn hostname(&self) -> Option<&str> {
        Some(&self.hostname)
    }
}

impl AsyncRead for DecoySniStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for DecoySniStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
