//! Plain DNS resolver using hickory-dns against explicit name servers.
//!
//! The operating system's resolver configuration is never consulted: a
//! poisoned or filtered ISP resolver is exactly what candidate resolution is
//! meant to route around. Only A records are requested.

use super::{Addrs, Name, Resolve, Resolving};
use crate::base::neterror::NetError;
use hickory_resolver::{
    config::{LookupIpStrategy, NameServerConfigGroup, ResolverConfig},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use std::{
    net::{IpAddr, Ipv4Addr},
    sync::{Arc, LazyLock},
};

/// Name servers used by the built-in fallback resolver.
pub const DEFAULT_FALLBACK_SERVERS: [IpAddr; 2] = [
    IpAddr::V4(Ipv4Addr::new(185, 222, 222, 222)),
    IpAddr::V4(Ipv4Addr::new(45, 11, 45, 11)),
];

/// Name server used by [`super::resolve`] when the caller names none.
pub const DEFAULT_PLAIN_SERVER: IpAddr = IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8));

/// Async A-record resolver backed by hickory-dns.
///
/// [`HickoryResolver::new`] shares one lazily built resolver pointed at
/// [`DEFAULT_FALLBACK_SERVERS`]; [`HickoryResolver::with_servers`] builds a
/// dedicated one.
///
/// # Example
///
/// ```rust,ignore
/// use decoynet::dns::{HickoryResolver, Name, Resolve};
///
/// let resolver = HickoryResolver::with_servers(&["1.1.1.1".parse()?]);
/// let addrs = resolver.resolve(Name::new("example.com")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HickoryResolver {
    resolver: Arc<TokioResolver>,
}

impl HickoryResolver {
    /// Creates the shared fallback resolver.
    ///
    /// The underlying resolver is lazily initialized on first use.
    pub fn new() -> Self {
        static RESOLVER: LazyLock<Arc<TokioResolver>> =
            LazyLock::new(|| build(&DEFAULT_FALLBACK_SERVERS));

        Self {
            resolver: RESOLVER.clone(),
        }
    }

    /// Creates a resolver that queries only `servers` on port 53.
    pub fn with_servers(servers: &[IpAddr]) -> Self {
        Self {
            resolver: build(servers),
        }
    }
}

fn build(servers: &[IpAddr]) -> Arc<TokioResolver> {
    tracing::debug!(servers = ?servers, "building plain DNS resolver");
    let group = NameServerConfigGroup::from_ips_clear(servers, 53, true);
    let config = ResolverConfig::from_parts(None, vec![], group);

    let mut builder =
        TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
    builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4Only;

    Arc::new(builder.build())
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.resolver.clone();
        Box::pin(async move {
            let domain = name.as_str();
            tracing::debug!(domain = %domain, "resolving via hickory-dns");

            let lookup = resolver.lookup_ip(domain).await.map_err(|e| {
                tracing::debug!(domain = %domain, error = %e, "hickory-dns lookup failed");
                NetError::dns_failed(
                    domain,
                    std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
                )
            })?;

            let addrs: Vec<IpAddr> = lookup.iter().filter(IpAddr::is_ipv4).collect();

            if addrs.is_empty() {
                return Err(NetError::dns_failed(
                    domain,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "No A records returned"),
                ));
            }

            tracing::debug!(domain = %domain, count = addrs.len(), "hickory-dns resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_fallback_resolver() {
        let r1 = HickoryResolver::new();
        let r2 = HickoryResolver::new();
        assert!(Arc::ptr_eq(&r1.resolver, &r2.resolver));
    }

    #[test]
    fn test_dedicated_resolver_is_separate() {
        let shared = HickoryResolver::new();
        let own = HickoryResolver::with_servers(&[DEFAULT_PLAIN_SERVER]);
        assert!(!Arc::ptr_eq(&shared.resolver, &own.resolver));
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_with_domain() {
        // TEST-NET-1 never answers; the lookup must fail rather than fall
        // back to the system resolver.
        let resolver = HickoryResolver::with_servers(&[IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))]);
        let result = resolver
            .resolve(Name::new("this-domain-definitely-does-not-exist.invalid"))
            .await;

        match result {
            Err(NetError::NameNotResolvedFor { domain, .. }) => {
                assert_eq!(domain, "this-domain-definitely-does-not-exist.invalid");
            }
            Err(e) => panic!("Unexpected error type: {e:?}"),
            Ok(_) => panic!("Lookup should not succeed"),
        }
    }
}
