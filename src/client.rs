//! Multi-candidate fetch orchestration.
//!
//! Resolves the true host to a set of candidate addresses, then runs one
//! decoy-SNI attempt per candidate, either all at once (first success
//! wins) or one after another. Every attempt shares a single deadline.
//!
//! # Example
//!
//! ```rust,ignore
//! use decoynet::{client::{FetchConfig, FetchMode}, http::RequestSpec};
//! use std::time::Duration;
//!
//! let config = FetchConfig::builder()
//!     .candidate_strs(["210.140.92.140", "210.140.92.141"])?
//!     .timeout(Duration::from_secs(10))
//!     .mode(FetchMode::Race)
//!     .build();
//!
//! let resp = config
//!     .fetch(RequestSpec::get("https://i.pximg.net/img-original/img/1.png")?)
//!     .await?;
//! ```

use crate::base::deadline::Deadline;
use crate::base::neterror::{AttemptError, NetError};
use crate::dns::{CachedResolver, HickoryResolver, Name, Resolve, ResolveCache};
use crate::http::request::RequestSpec;
use crate::http::response::HttpResponse;
use crate::socket::connectjob::ConnectJob;
use crate::socket::connector::{Connect, ConnectTarget, DecoySniConnector};
use crate::socket::decoy::DEFAULT_DECOY_SNI;
use crate::socket::tls::TlsConfig;
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How candidates are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Start every attempt at once; the first complete response wins and
    /// the rest are torn down.
    #[default]
    Race,
    /// One attempt at a time, in candidate order, stopping at the first
    /// success.
    Sequential,
}

/// Fetch configuration.
///
/// Use [`FetchConfig::builder()`] to configure and create one. A config is
/// cheap to clone and can serve any number of fetches.
#[derive(Clone)]
pub struct FetchConfig {
    candidates: Vec<IpAddr>,
    resolver: Option<Arc<dyn Resolve>>,
    cache: Option<Arc<dyn ResolveCache>>,
    default_resolver: Option<Arc<dyn Resolve>>,
    timeout: Option<Duration>,
    mode: FetchMode,
    decoy_sni: String,
    connector: Arc<dyn Connect>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("candidates", &self.candidates)
            .field("resolver", &self.resolver.is_some())
            .field("cache", &self.cache.is_some())
            .field("timeout", &self.timeout)
            .field("mode", &self.mode)
            .field("decoy_sni", &self.decoy_sni)
            .finish_non_exhaustive()
    }
}

impl FetchConfig {
    /// Create a new config builder.
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::default()
    }

    pub fn candidates(&self) -> &[IpAddr] {
        &self.candidates
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    pub fn decoy_sni(&self) -> &str {
        &self.decoy_sni
    }

    /// Fetch `request` using this configuration. See [`fetch`].
    pub async fn fetch(&self, request: RequestSpec) -> Result<HttpResponse, NetError> {
        fetch(self, request).await
    }

    fn cached(&self, inner: Arc<dyn Resolve>) -> Arc<dyn Resolve> {
        match &self.cache {
            Some(cache) => Arc::new(CachedResolver::new(inner, cache.clone())),
            None => inner,
        }
    }

    fn target(&self, addr: IpAddr, request: &RequestSpec) -> ConnectTarget {
        ConnectTarget::new(addr, request.port(), request.hostname())
            .with_decoy_sni(self.decoy_sni.clone())
    }

    /// Explicit candidates first, then the configured resolver's answers,
    /// duplicates dropped. The default resolver is asked, once, only when
    /// that leaves nothing.
    async fn resolve_candidates(
        &self,
        host: &str,
        deadline: &Deadline,
    ) -> Result<Vec<IpAddr>, NetError> {
        let mut candidates = Vec::with_capacity(self.candidates.len());
        extend_unique(&mut candidates, self.candidates.iter().copied());

        if let Some(resolver) = &self.resolver {
            let lookup = self.cached(resolver.clone()).resolve(Name::new(host));
            match deadline.observe(lookup).await? {
                Ok(addrs) => extend_unique(&mut candidates, addrs),
                Err(e) if !candidates.is_empty() => {
                    tracing::warn!(domain = %host, error = %e, "resolver failed, using explicit candidates only");
                }
                Err(e) => return Err(e),
            }
        }

        if candidates.is_empty() {
            tracing::warn!(domain = %host, "Use default DNS server, make sure it can resolve correct ip(s)!");
            let fallback = self
                .default_resolver
                .clone()
                .unwrap_or_else(|| Arc::new(HickoryResolver::new()));
            let lookup = self.cached(fallback).resolve(Name::new(host));
            extend_unique(&mut candidates, deadline.observe(lookup).await??);
        }

        if candidates.is_empty() {
            return Err(NetError::dns_failed(
                host,
                io::Error::new(io::ErrorKind::NotFound, "no candidate addresses"),
            ));
        }

        tracing::debug!(domain = %host, candidates = ?candidates, "candidate list ready");
        Ok(candidates)
    }

    async fn race(
        &self,
        request: &RequestSpec,
        candidates: &[IpAddr],
        deadline: &Deadline,
    ) -> Result<HttpResponse, NetError> {
        let connector = self.connector.as_ref();
        let mut in_flight: FuturesUnordered<_> = candidates
            .iter()
            .enumerate()
            .map(|(idx, &addr)| {
                let job = ConnectJob::new(self.target(addr, request), request, connector, deadline);
                async move { (idx, job.run().await) }
            })
            .collect();

        let mut failures = Vec::with_capacity(candidates.len());
        while let Some((idx, outcome)) = in_flight.next().await {
            match outcome {
                Ok(response) => {
                    tracing::debug!(addr = %candidates[idx], status = response.status_code(), "attempt won the race");
                    // Losers still in flight are dropped here, closing their sockets.
                    deadline.token().cancel();
                    drop(in_flight);
                    return Ok(response);
                }
                Err(failure) => {
                    tracing::debug!(
                        addr = %failure.addr,
                        stage = ?failure.stage,
                        error = %failure.error,
                        "{} is unable to connect",
                        failure.addr
                    );
                    failures.push((idx, failure));
                }
            }
        }

        failures.sort_by_key(|(idx, _)| *idx);
        Err(aggregate(
            failures.into_iter().map(|(_, f)| f).collect(),
            deadline,
        ))
    }

    async fn sequential(
        &self,
        request: &RequestSpec,
        candidates: &[IpAddr],
        deadline: &Deadline,
    ) -> Result<HttpResponse, NetError> {
        let connector = self.connector.as_ref();
        let mut failures = Vec::with_capacity(candidates.len());

        for &addr in candidates {
            if deadline.is_cancelled() || deadline.is_expired() {
                break;
            }
            let job = ConnectJob::new(self.target(addr, request), request, connector, deadline);
            match job.run().await {
                Ok(response) => return Ok(response),
                Err(failure) => {
                    tracing::info!(
                        addr = %addr,
                        stage = ?failure.stage,
                        error = %failure.error,
                        "{addr} is unable to connect"
                    );
                    failures.push(failure);
                    // A socket-level timeout only fails this candidate; the
                    // shared deadline decides when to stop.
                    if deadline.is_cancelled() || deadline.is_expired() {
                        break;
                    }
                }
            }
        }

        Err(aggregate(failures, deadline))
    }
}

fn extend_unique(candidates: &mut Vec<IpAddr>, addrs: impl IntoIterator<Item = IpAddr>) {
    for addr in addrs {
        if !candidates.contains(&addr) {
            candidates.push(addr);
        }
    }
}

fn aggregate(attempts: Vec<AttemptError>, deadline: &Deadline) -> NetError {
    if deadline.is_cancelled() {
        tracing::debug!(attempts = attempts.len(), "fetch aborted by caller");
        return NetError::Aborted;
    }
    let timed_out = deadline.is_expired();
    let error = NetError::AllAttemptsFailed {
        attempts,
        timed_out,
    };
    tracing::warn!(error = %error, "all candidate addresses failed");
    error
}

/// Builder for creating a [`FetchConfig`].
#[derive(Default)]
pub struct FetchConfigBuilder {
    candidates: Vec<IpAddr>,
    resolver: Option<Arc<dyn Resolve>>,
    cache: Option<Arc<dyn ResolveCache>>,
    default_resolver: Option<Arc<dyn Resolve>>,
    timeout: Option<Duration>,
    mode: FetchMode,
    decoy_sni: Option<String>,
    tls_config: Option<TlsConfig>,
    connector: Option<Arc<dyn Connect>>,
}

impl FetchConfigBuilder {
    /// Add one explicit candidate address.
    pub fn candidate(mut self, addr: IpAddr) -> Self {
        self.candidates.push(addr);
        self
    }

    /// Add explicit candidate addresses, tried before any resolver answer.
    pub fn candidates(mut self, addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        self.candidates.extend(addrs);
        self
    }

    /// Add candidates given as IP literals.
    pub fn candidate_strs<I, S>(mut self, addrs: I) -> Result<Self, NetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for addr in addrs {
            let addr = addr.as_ref();
            let ip = addr
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| NetError::InvalidCandidate(addr.to_string()))?;
            self.candidates.push(ip);
        }
        Ok(self)
    }

    /// Set a resolver whose answers are appended to the explicit candidates.
    pub fn resolver(mut self, resolver: impl Resolve + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn resolver_arc(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Consult `cache` before any live resolution. The cache is never written.
    pub fn cache(mut self, cache: Arc<dyn ResolveCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the built-in fallback resolver used when no candidates remain.
    pub fn default_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.default_resolver = Some(resolver);
        self
    }

    /// Bound the whole fetch, resolution included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Server name presented in the ClientHello.
    pub fn decoy_sni(mut self, name: impl Into<String>) -> Self {
        self.decoy_sni = Some(name.into());
        self
    }

    /// TLS settings for the built-in connector. Ignored when a custom
    /// connector is set.
    pub fn tls_config(mut self, config: TlsConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Replace the transport factory.
    pub fn connector(mut self, connector: Arc<dyn Connect>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn build(self) -> FetchConfig {
        let connector = self.connector.unwrap_or_else(|| {
            Arc::new(DecoySniConnector::new(self.tls_config.unwrap_or_default()))
        });
        FetchConfig {
            candidates: self.candidates,
            resolver: self.resolver,
            cache: self.cache,
            default_resolver: self.default_resolver,
            timeout: self.timeout,
            mode: self.mode,
            decoy_sni: self
                .decoy_sni
                .unwrap_or_else(|| DEFAULT_DECOY_SNI.to_string()),
            connector,
        }
    }
}

/// Fetch `request` from the first candidate address that answers.
///
/// One deadline, started before resolution, bounds everything. When every
/// attempt fails the error is [`NetError::AllAttemptsFailed`] listing each
/// address once, in candidate order. Cancelling the request's token yields
/// [`NetError::Aborted`]. No attempt's socket outlives this call.
pub async fn fetch(config: &FetchConfig, request: RequestSpec) -> Result<HttpResponse, NetError> {
    let deadline = Deadline::new(config.timeout, fetch_token(&request));
    let host = request.hostname().to_string();

    let candidates = config.resolve_candidates(&host, &deadline).await?;

    tracing::debug!(
        host = %host,
        mode = ?config.mode,
        count = candidates.len(),
        "starting attempts"
    );

    match config.mode {
        FetchMode::Race => config.race(&request, &candidates, &deadline).await,
        FetchMode::Sequential => config.sequential(&request, &candidates, &deadline).await,
    }
}

/// One attempt against `addr`, with no racing and no time limit beyond the
/// request's own cancellation token.
pub async fn fetch_via(
    addr: IpAddr,
    request: RequestSpec,
    decoy: Option<&str>,
) -> Result<HttpResponse, NetError> {
    let deadline = Deadline::new(None, fetch_token(&request));
    let connector = DecoySniConnector::default();
    let target = ConnectTarget::new(addr, request.port(), request.hostname())
        .with_decoy_sni(decoy.unwrap_or(DEFAULT_DECOY_SNI));

    ConnectJob::new(target, &request, &connector, &deadline)
        .run()
        .await
        .map_err(|failure| failure.error)
}

// A child token lets the fetch cancel its own attempts without touching
// the caller's token.
fn fetch_token(request: &RequestSpec) -> CancellationToken {
    request
        .cancellation()
        .map(CancellationToken::child_token)
        .unwrap_or_default()
}
