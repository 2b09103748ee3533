//! Shared deadline for one fetch call.
//!
//! A single [`Deadline`] is created per outer fetch and borrowed by every
//! attempt. Each suspension point (connect, handshake, write, read) is
//! wrapped in [`Deadline::observe`], which races the operation against the
//! deadline instant and the cancellation token.

use crate::base::neterror::NetError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct Deadline {
    at: Option<Instant>,
    cancel: CancellationToken,
}

impl Deadline {
    /// Starts the clock now. `None` means no time limit; the token still applies.
    pub fn new(timeout: Option<Duration>, cancel: CancellationToken) -> Self {
        Self {
            at: timeout.map(|t| Instant::now() + t),
            cancel,
        }
    }

    /// A deadline that never elapses and is never cancelled.
    pub fn never() -> Self {
        Self::new(None, CancellationToken::new())
    }

    pub fn at(&self) -> Option<Instant> {
        self.at
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time left before expiry, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Drives `fut` unless the deadline elapses or the token fires first.
    ///
    /// Cancellation is checked before the deadline so that an aborted fetch
    /// reports `Aborted` rather than a timeout.
    pub async fn observe<F: Future>(&self, fut: F) -> Result<F::Output, NetError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(NetError::Aborted),
            _ = sleep_until(self.at) => Err(NetError::ConnectionTimedOut),
            out = fut => Ok(out),
        }
    }
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
