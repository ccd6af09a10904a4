//! Shared request budget.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{clock::DefaultClock, Quota, RateLimiter};

type DirectRateLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, DefaultClock>;

/// Token bucket gating every outgoing attempt, retries included.
///
/// Clones share one bucket, so the budget holds across tasks.
#[derive(Clone)]
pub struct RequestLimiter {
    inner: Arc<DirectRateLimiter>,
    per_second: Option<NonZeroU32>,
}

impl RequestLimiter {
    /// `0` disables limiting.
    ///
    /// The burst equals the per-second rate, matching a bucket that starts full.
    pub fn per_second(requests: u32) -> Self {
        let per_second = NonZeroU32::new(requests);
        let quota = Quota::per_second(per_second.unwrap_or(NonZeroU32::MAX));
        Self {
            inner: Arc::new(RateLimiter::direct(quota)),
            per_second,
        }
    }

    pub fn unlimited() -> Self {
        Self::per_second(0)
    }

    /// Waits until a token is available.
    pub async fn acquire(&self) {
        if self.per_second.is_some() {
            self.inner.until_ready().await;
        }
    }

    pub fn rate(&self) -> Option<u32> {
        self.per_second.map(NonZeroU32::get)
    }
}

impl std::fmt::Debug for RequestLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLimiter")
            .field("per_second", &self.rate())
            .finish()
    }
}
