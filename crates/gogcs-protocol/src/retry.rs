//! Retry policy with exponential backoff
//!
//! Only the HTTP transport retries. Depot, build and chunklist loads see a
//! single outcome per fetch and never retry on their own.

use rand::{RngExt, rng};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::config::env_or;
use crate::error::Result;

/// Exponential backoff applied by the HTTP transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retry attempts
    pub max_attempts: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier
    pub multiplier: f64,

    /// Add jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that gives up after the first failure
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Create retry policy from environment variables
    ///
    /// Reads `GOGCS_MAX_RETRIES`, `GOGCS_RETRY_BACKOFF` (milliseconds),
    /// `GOGCS_MAX_BACKOFF` (seconds) and `GOGCS_RETRY_JITTER`. The
    /// multiplier keeps its default.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            max_attempts: env_or("GOGCS_MAX_RETRIES", defaults.max_attempts),
            initial_backoff: Duration::from_millis(env_or("GOGCS_RETRY_BACKOFF", 100)),
            max_backoff: Duration::from_secs(env_or("GOGCS_MAX_BACKOFF", 10)),
            jitter: env_or("GOGCS_RETRY_JITTER", defaults.jitter),
            ..defaults
        })
    }

    /// Delay before the next attempt
    ///
    /// Jitter adds up to 30% of `backoff`. A Retry-After hint raises the
    /// delay, capped at the maximum backoff.
    fn delay(&self, backoff: Duration, hint: Option<Duration>) -> Duration {
        let mut delay = backoff;
        if self.jitter {
            delay = delay.mul_f64(1.0 + rng().random_range(0.0..0.3_f64));
        }
        match hint {
            Some(hint) => delay.max(hint.min(self.max_backoff)),
            None => delay,
        }
    }

    /// Run `f` until it succeeds, fails permanently or attempts run out
    pub async fn execute<F, Fut, T>(&self, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            let error = match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.should_retry() && attempt < self.max_attempts => e,
                Err(e) => return Err(e),
            };
            attempt += 1;

            let delay = self.delay(backoff, error.retry_after_hint());
            tracing::warn!(attempt, ?delay, "Request failed, retrying: {}", error);
            tokio::time::sleep(delay).await;

            backoff = Duration::try_from_secs_f64(backoff.as_secs_f64() * self.multiplier)
                .map_or(self.max_backoff, |next| next.min(self.max_backoff));
        }
    }
}

#[cfg(test)]
#[allow(
    unsafe_code,
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::significant_drop_tightening
)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(20),
            multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_millis(100));
        assert_eq!(policy.max_backoff, Duration::from_secs(10));
        assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
        assert!(policy.jitter);
        assert_eq!(RetryPolicy::none().max_attempts, 0);
    }

    #[test]
    fn test_from_env_custom_values() {
        let vars = [
            ("GOGCS_MAX_RETRIES", "5"),
            ("GOGCS_RETRY_BACKOFF", "200"),
            ("GOGCS_MAX_BACKOFF", "20"),
            ("GOGCS_RETRY_JITTER", "false"),
        ];
        for (var, value) in vars {
            unsafe {
                std::env::set_var(var, value);
            }
        }

        let policy = RetryPolicy::from_env().expect("Operation should succeed");
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(200));
        assert_eq!(policy.max_backoff, Duration::from_secs(20));
        assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
        assert!(!policy.jitter);

        for (var, _) in vars {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_delay_honors_capped_hint() {
        let policy = fast_policy(1);
        let backoff = Duration::from_millis(2);
        assert_eq!(policy.delay(backoff, None), backoff);
        assert_eq!(
            policy.delay(backoff, Some(Duration::from_secs(60))),
            Duration::from_millis(20)
        );

        let jittered = RetryPolicy { jitter: true, ..policy }.delay(Duration::from_millis(100), None);
        assert!(jittered >= Duration::from_millis(100));
        assert!(jittered <= Duration::from_millis(130));
    }

    #[tokio::test]
    async fn test_execute_retry_on_retryable_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = fast_policy(3)
            .execute(|| {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ProtocolError::Timeout)
                    } else {
                        Ok::<i32, ProtocolError>(42)
                    }
                }
            })
            .await;

        assert_eq!(result.expect("Operation should succeed"), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_fail_on_non_retryable_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = fast_policy(3)
            .execute(|| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, ProtocolError>(ProtocolError::UnsupportedGeneration(3))
                }
            })
            .await;

        assert!(matches!(
            result.expect_err("Test operation should fail"),
            ProtocolError::UnsupportedGeneration(3)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_exceed_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = fast_policy(2)
            .execute(|| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, ProtocolError>(ProtocolError::ServiceUnavailable)
                }
            })
            .await;

        assert!(matches!(result, Err(ProtocolError::ServiceUnavailable)));
        // initial attempt plus two retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_after_hint_is_capped() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let start = Instant::now();

        let _result = fast_policy(1)
            .execute(|| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, ProtocolError>(ProtocolError::RateLimited {
                        retry_after: Some(Duration::from_secs(3600)),
                    })
                }
            })
            .await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(20));
        assert!(elapsed < Duration::from_secs(5));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
