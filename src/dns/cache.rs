//! Caller-owned resolution cache.
//!
//! The cache is a capability handed to [`CachedResolver`] by reference; the
//! resolver never creates, fills or evicts it. A hit short-circuits live
//! resolution, a miss falls through to the inner resolver, and the live
//! answer is *not* written back. Callers who want write-back call
//! [`ResolveCache::put`] themselves.

use super::{Addrs, Name, Resolve, Resolving};
use dashmap::DashMap;
use std::{fmt, net::IpAddr, sync::Arc};

/// Lookup/store capability for pre-seeded candidate addresses.
pub trait ResolveCache: Send + Sync {
    fn get(&self, domain: &str) -> Option<Vec<IpAddr>>;
    fn put(&self, domain: &str, addrs: Vec<IpAddr>);
}

/// In-memory [`ResolveCache`] keyed by exact domain string.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Vec<IpAddr>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cache pre-seeded with `(domain, addresses)` pairs.
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<IpAddr>)>,
        S: Into<String>,
    {
        let cache = Self::new();
        for (domain, addrs) in entries {
            cache.entries.insert(domain.into(), addrs);
        }
        cache
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResolveCache for MemoryCache {
    fn get(&self, domain: &str) -> Option<Vec<IpAddr>> {
        self.entries.get(domain).map(|e| e.value().clone())
    }

    fn put(&self, domain: &str, addrs: Vec<IpAddr>) {
        self.entries.insert(domain.to_string(), addrs);
    }
}

/// Read-through resolver over a caller-owned cache.
///
/// # Example
///
/// ```rust,ignore
/// use decoynet::dns::{CachedResolver, HickoryResolver, MemoryCache};
/// use std::sync::Arc;
///
/// let cache = Arc::new(MemoryCache::with_entries([
///     ("i.pximg.net", vec!["210.140.92.140".parse()?]),
/// ]));
/// let resolver = CachedResolver::new(Arc::new(HickoryResolver::new()), cache.clone());
/// ```
pub struct CachedResolver {
    inner: Arc<dyn Resolve>,
    cache: Arc<dyn ResolveCache>,
}

impl CachedResolver {
    pub fn new(inner: Arc<dyn Resolve>, cache: Arc<dyn ResolveCache>) -> Self {
        Self { inner, cache }
    }
}

impl Resolve for CachedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        if let Some(addrs) = self.cache.get(name.as_str()) {
            tracing::debug!(domain = %name, count = addrs.len(), "resolution served from cache");
            let addrs: Addrs = Box::new(addrs.into_iter());
            return Box::pin(std::future::ready(Ok(addrs)));
        }
        self.inner.resolve(name)
    }
}

impl fmt::Debug for CachedResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedResolver").finish_non_exhaustive()
    }
}
