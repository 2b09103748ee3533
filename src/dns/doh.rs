//! DNS-over-HTTPS resolver speaking the JSON API (`application/dns-json`).
//!
//! The endpoint is contacted under its real name, with full certificate
//! verification unless other TLS settings are supplied, over a one-shot
//! HTTP/1.1 connection driven by hyper.

use super::{Addrs, Name, Resolve, Resolving};
use crate::base::context::DohResultExt;
use crate::base::neterror::NetError;
use crate::socket::tls::{TlsConfig, TlsConnector};
use bytes::Bytes;
use http::header::{ACCEPT, HOST};
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use tokio::net::TcpStream;
use url::Url;

/// Endpoint used when a caller asks for DoH without naming one.
pub const DEFAULT_DOH_SERVER: &str = "https://cloudflare-dns.com/dns-query";

const RECORD_TYPE_A: u16 = 1;

#[derive(Debug, Deserialize)]
struct DohMessage {
    #[serde(rename = "Status")]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

/// Resolver that queries a DoH JSON endpoint for A records.
///
/// Any failure to reach the endpoint or to read its answer is reported as
/// [`NetError::DohResponseInvalid`], so it stays in the resolution family.
#[derive(Debug, Clone)]
pub struct DohResolver {
    endpoint: Url,
    tls: TlsConnector,
}

impl DohResolver {
    /// Only `https` endpoints with a host are accepted.
    pub fn new(endpoint: Url) -> Result<Self, NetError> {
        if endpoint.scheme() != "https" {
            return Err(NetError::DisallowedUrlScheme);
        }
        if endpoint.host_str().is_none() {
            return Err(NetError::InvalidUrl);
        }
        Ok(Self {
            endpoint,
            tls: TlsConnector::new(&TlsConfig::verified())?,
        })
    }

    pub fn parse(endpoint: &str) -> Result<Self, NetError> {
        Self::new(Url::parse(endpoint)?)
    }

    /// Replace the TLS settings used to reach the endpoint.
    pub fn with_tls_config(mut self, config: TlsConfig) -> Result<Self, NetError> {
        self.tls = TlsConnector::new(&config)?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn query_url(&self, domain: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("name", domain)
            .append_pair("type", "A");
        url
    }

    async fn query(&self, domain: &str) -> Result<Vec<IpAddr>, NetError> {
        let server = self.endpoint.as_str();
        let url = self.query_url(domain);
        let host = url.host_str().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().unwrap_or(443);

        let addr = tokio::net::lookup_host((host, port))
            .await
            .doh_context(server, "resolve endpoint")?
            .next()
            .ok_or_else(|| NetError::DohResponseInvalid {
                server: server.to_string(),
                reason: format!("no address for {host}"),
            })?;

        let tcp = TcpStream::connect(addr)
            .await
            .doh_context(server, "connect")?;
        let config = self.tls.configure(host).doh_context(server, "TLS setup")?;
        let tls = tokio_boring::connect(config, host, tcp)
            .await
            .doh_context(server, "TLS handshake")?;

        let (mut sender, conn) = http1::handshake(TokioIo::new(tls))
            .await
            .doh_context(server, "HTTP handshake")?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "DoH connection closed with error");
            }
        });

        let path = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };
        let request = http::Request::get(path)
            .header(HOST, host)
            .header(ACCEPT, "application/dns-json")
            .body(Empty::<Bytes>::new())
            .map_err(|_| NetError::InvalidUrl)?;

        let response = sender
            .send_request(request)
            .await
            .doh_context(server, "request")?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetError::DohResponseInvalid {
                server: server.to_string(),
                reason: format!("HTTP status {status}"),
            });
        }

        let body = response
            .into_body()
            .collect()
            .await
            .doh_context(server, "read body")?
            .to_bytes();

        parse_doh_response(&body, server)
    }
}

impl Resolve for DohResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let this = self.clone();
        Box::pin(async move {
            tracing::debug!(domain = %name, server = %this.endpoint, "resolving via DoH");
            let addrs = this.query(name.as_str()).await?;
            tracing::debug!(domain = %name, count = addrs.len(), "DoH resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

/// Extracts A-record addresses from a DoH JSON body, in answer order.
///
/// Non-A answers (CNAME chains and the like) are skipped. A missing
/// `Answer` array yields no addresses; a non-zero `Status` or an A record
/// whose data is not an IPv4 literal is an error.
pub fn parse_doh_response(body: &[u8], server: &str) -> Result<Vec<IpAddr>, NetError> {
    let invalid = |reason: String| NetError::DohResponseInvalid {
        server: server.to_string(),
        reason,
    };

    let message: DohMessage =
        serde_json::from_slice(body).map_err(|e| invalid(format!("malformed JSON: {e}")))?;

    if message.status != 0 {
        return Err(invalid(format!("DNS status {}", message.status)));
    }

    message
        .answer
        .into_iter()
        .filter(|answer| answer.record_type == RECORD_TYPE_A)
        .map(|answer| {
            answer
                .data
                .parse::<Ipv4Addr>()
                .map(IpAddr::V4)
                .map_err(|_| invalid(format!("A record with non-IPv4 data {:?}", answer.data)))
        })
        .collect()
}
