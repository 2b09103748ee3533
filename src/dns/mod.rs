//! Candidate-address resolution.
//!
//! Provides pluggable A-record resolution with support for:
//! - Plain DNS against explicit name servers (hickory-dns)
//! - DNS-over-HTTPS JSON endpoints
//! - A caller-owned read-through cache
//!
//! # Architecture
//!
//! This module mirrors Chromium's `HostResolver` concept, narrowed to what
//! a decoy-SNI fetch needs: a list of IPv4 candidates for the true host.
//! The `Resolve` trait is the core abstraction that allows different
//! resolver implementations to be used interchangeably, and the fetch
//! layer only ever sees `Arc<dyn Resolve>`.
//!
//! # Example
//!
//! ```rust,ignore
//! use decoynet::dns::{self, NameServers};
//!
//! let addrs = dns::resolve("i.pximg.net", NameServers::default()).await?;
//! let addrs = dns::resolve("i.pximg.net", "https://dns.example/dns-query".into()).await?;
//! ```

mod cache;
mod doh;
mod hickory;
mod resolve;

pub use cache::{CachedResolver, MemoryCache, ResolveCache};
pub use doh::{parse_doh_response, DohResolver, DEFAULT_DOH_SERVER};
pub use hickory::{HickoryResolver, DEFAULT_FALLBACK_SERVERS, DEFAULT_PLAIN_SERVER};
pub use resolve::{Addrs, FnResolver, Name, Resolve, Resolving};

use crate::base::neterror::NetError;
use std::net::IpAddr;
use std::sync::Arc;

/// Which servers a standalone lookup should ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameServers {
    /// Plain DNS on port 53.
    Plain(Vec<IpAddr>),
    /// A DoH JSON endpoint (kept as text; validated when used).
    Doh(String),
}

impl NameServers {
    pub fn doh(endpoint: impl Into<String>) -> Self {
        NameServers::Doh(endpoint.into())
    }

    pub fn plain(servers: impl IntoIterator<Item = IpAddr>) -> Self {
        NameServers::Plain(servers.into_iter().collect())
    }
}

impl Default for NameServers {
    fn default() -> Self {
        NameServers::Plain(vec![DEFAULT_PLAIN_SERVER])
    }
}

impl From<&str> for NameServers {
    fn from(endpoint: &str) -> Self {
        NameServers::Doh(endpoint.to_string())
    }
}

impl From<Vec<IpAddr>> for NameServers {
    fn from(servers: Vec<IpAddr>) -> Self {
        NameServers::Plain(servers)
    }
}

/// Builds the resolver for `servers`.
///
/// An empty plain list falls back to [`DEFAULT_PLAIN_SERVER`].
pub fn resolver_for(servers: &NameServers) -> Result<Arc<dyn Resolve>, NetError> {
    match servers {
        NameServers::Plain(ips) if ips.is_empty() => Ok(Arc::new(HickoryResolver::with_servers(&[
            DEFAULT_PLAIN_SERVER,
        ]))),
        NameServers::Plain(ips) => Ok(Arc::new(HickoryResolver::with_servers(ips))),
        NameServers::Doh(endpoint) => Ok(Arc::new(DohResolver::parse(endpoint)?)),
    }
}

/// Resolves `domain` to IPv4 addresses, in answer order.
pub async fn resolve(domain: &str, servers: NameServers) -> Result<Vec<IpAddr>, NetError> {
    let resolver = resolver_for(&servers)?;
    Ok(resolver.resolve(Name::new(domain)).await?.collect())
}

/// Like [`resolve`], consulting `cache` first. Live answers are not
/// written back.
pub async fn cache_resolve(
    domain: &str,
    servers: NameServers,
    cache: &dyn ResolveCache,
) -> Result<Vec<IpAddr>, NetError> {
    if let Some(addrs) = cache.get(domain) {
        tracing::debug!(domain = %domain, count = addrs.len(), "resolution served from cache");
        return Ok(addrs);
    }
    resolve(domain, servers).await
}
