//! Shared admission gate for the provider's request budget.
//!
//! The provider enforces a global rate limit, so one [`IntervalGate`] is
//! shared by every worker in the fetch pipeline. The gate admits at most one
//! call per configured interval regardless of how many callers are waiting.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tokio_util::sync::CancellationToken;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Outcome of waiting on the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The caller owns the current interval's single permit.
    Granted,
    /// The shutdown token fired while waiting; the gated call must not run.
    Cancelled,
}

/// One-permit-per-interval gate shared across concurrent workers.
#[derive(Clone)]
pub struct IntervalGate {
    limiter: Arc<DirectRateLimiter>,
}

impl IntervalGate {
    pub fn new(interval: Duration) -> Self {
        let quota = Quota::with_period(interval.max(Duration::from_millis(1)))
            .expect("interval is clamped to be non-zero")
            .allow_burst(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Block until the interval permit is available or shutdown is requested.
    ///
    /// A cancelled token always wins over an available permit, so once
    /// shutdown starts no further calls are admitted.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Admission {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Admission::Cancelled,
            () = self.limiter.until_ready() => Admission::Granted,
        }
    }
}
