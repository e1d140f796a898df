//! Bounded Retry
//!
//! Explicit retry policy (attempt bound plus backoff function) supplied by
//! the caller. Any error is retried until the bound is reached.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

/// Delay between attempts
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Backoff {
    /// Same delay after every failure
    Fixed(Duration),
    /// `initial * multiplier^(n-1)`, capped at `max`
    Exponential {
        initial: Duration,
        multiplier: f64,
        max: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the `failures`-th failed attempt (1-based)
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, multiplier, max } => {
                let exponent = i32::try_from(failures.saturating_sub(1)).unwrap_or(i32::MAX);
                let scaled = initial.as_secs_f64() * multiplier.powi(exponent);
                if scaled.is_infinite() || scaled >= max.as_secs_f64() {
                    max
                } else {
                    // a negative multiplier can swing below zero
                    Duration::from_secs_f64(scaled.max(0.0))
                }
            }
        }
    }
}

/// Retry policy configuration
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay between attempts
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    /// Ten attempts, two seconds apart
    fn default() -> Self {
        Self::fixed(10, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub const fn exponential(max_attempts: u32, initial: Duration, max: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential {
                initial,
                multiplier: 2.0,
                max,
            },
        }
    }

    /// A single attempt
    pub const fn no_retry() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Run `operation` until it succeeds or the attempts are used up.
    /// Returns the last error on exhaustion.
    pub async fn execute<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut failures = 0;

        loop {
            debug!(attempt = failures + 1, attempts, operation = operation_name, "Attempting");

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    failures += 1;
                    warn!(attempt = failures, operation = operation_name, error = %e, "Attempt failed");

                    if failures >= attempts {
                        return Err(e);
                    }
                    sleep(self.backoff.delay(failures)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_backoff_caps() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_millis(100),
            multiplier: 2.0,
            max: Duration::from_millis(500),
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(4), Duration::from_millis(500));
        assert_eq!(backoff.delay(60), Duration::from_millis(500));
    }

    #[test]
    fn test_negative_multiplier_never_goes_below_zero() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_secs(1),
            multiplier: -2.0,
            max: Duration::from_secs(30),
        };
        assert_eq!(backoff.delay(1), Duration::from_secs(1));
        assert_eq!(backoff.delay(2), Duration::ZERO);
        assert_eq!(backoff.delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_policy_constructors() {
        let policy = RetryPolicy::exponential(5, Duration::from_secs(1), Duration::from_secs(30));
        assert_eq!(policy.backoff.delay(3), Duration::from_secs(4));
        assert_eq!(RetryPolicy::no_retry().max_attempts, 1);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.backoff, Backoff::Fixed(Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::fixed(3, Duration::from_secs(2));

        let result: Result<u32, String> = policy
            .execute("flaky", || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("fail {n}")) } else { Ok(n) }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error_when_exhausted() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::fixed(4, Duration::from_millis(10));

        let result: Result<(), String> = policy
            .execute("always", || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("fail {n}"))
            })
            .await;

        assert_eq!(result, Err("fail 4".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
