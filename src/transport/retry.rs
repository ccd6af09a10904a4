//! Exponential backoff for retryable request failures.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::FetchError;

/// Default retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);
/// Default cap for a single backoff
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);
/// Default growth factor per retry
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// How many times and how patiently a request is retried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            DEFAULT_BASE_DELAY,
            DEFAULT_MAX_DELAY,
            DEFAULT_MULTIPLIER,
        )
    }
}

impl RetryPolicy {
    /// A multiplier below 1.0 is raised to 1.0 so delays never shrink.
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        let multiplier = if multiplier.is_finite() {
            multiplier.max(1.0)
        } else {
            DEFAULT_MULTIPLIER
        };
        Self {
            max_retries,
            base_delay,
            max_delay: max_delay.max(base_delay),
            multiplier,
        }
    }

    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO, 1.0)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay slept before retry `retry` (0-based): `min(max, base * mult^retry)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let millis = self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are exhausted. `op` receives the 0-based attempt number.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries() => {
                let backoff = policy.delay_for(attempt);
                warn!(
                    "Request failed (attempt {}): {}, retrying in {:?}",
                    attempt + 1,
                    e,
                    backoff
                );
                sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                debug!("Request failed (attempt {}): {}, not retrying", attempt + 1, e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn server_error() -> FetchError {
        FetchError::HttpStatus {
            status: 503,
            body: String::new(),
        }
    }

    #[test]
    fn test_delay_growth_and_cap() {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(100),
            Duration::from_millis(500),
            2.0,
        );
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(500));
        assert_eq!(policy.delay_for(40), Duration::from_millis(500));
    }

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.delay_for(0), DEFAULT_BASE_DELAY);
    }

    #[test]
    fn test_shrinking_multiplier_is_clamped() {
        let policy = RetryPolicy::new(2, Duration::from_millis(50), Duration::from_secs(1), 0.5);
        assert_eq!(policy.delay_for(3), Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5), 2.0);

        let result = run_with_retry(&policy, move |_| async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(server_error())
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(1), 1.0);

        let result: Result<(), _> = run_with_retry(&policy, move |_| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(server_error())
        })
        .await;

        assert!(matches!(result, Err(FetchError::HttpStatus { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_millis(1), Duration::from_millis(1), 1.0);

        let result: Result<(), _> = run_with_retry(&policy, move |_| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Api {
                status: 404,
                text: "no such id".to_string(),
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempt_numbers_are_passed_in_order() {
        let seen = parking_lot::Mutex::new(Vec::new());
        let policy = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(1), 1.0);

        let _: Result<(), _> = run_with_retry(&policy, |attempt| {
            seen.lock().push(attempt);
            async { Err(server_error()) }
        })
        .await;

        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }
}
