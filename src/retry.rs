use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use tracing::warn;

use crate::config::RetryConfig;

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Outcome of a retried operation that never succeeded
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last: E },
    /// An attempt failed with an error that is not worth retrying
    Permanent(E),
}

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier: Duration::from_secs(2),
            min_wait: Duration::from_secs(5),
            max_wait: Duration::from_secs(15),
        }
    }
}

impl TryFrom<&RetryConfig> for RetryPolicy {
    type Error = anyhow::Error;

    fn try_from(config: &RetryConfig) -> anyhow::Result<Self> {
        let min_wait = seconds("retry.min_wait_secs", config.min_wait_secs)?;
        let max_wait = seconds("retry.max_wait_secs", config.max_wait_secs)?;

        Ok(Self {
            max_attempts: config.max_attempts.max(1),
            multiplier: seconds("retry.multiplier_secs", config.multiplier_secs)?,
            min_wait,
            max_wait: max_wait.max(min_wait),
        })
    }
}

fn seconds(field: &str, value: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value)
        .with_context(|| format!("{field} must be a finite, non-negative number of seconds (got {value})"))
}

impl RetryPolicy {
    /// Wait after the given 1-based attempt fails: multiplier * 2^(attempt-1), clamped
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let raw = self.multiplier.saturating_mul(1u32 << exponent);
        raw.clamp(self.min_wait, self.max_wait.max(self.min_wait))
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    /// The closure receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(RetryError::Permanent(e)),
                Err(e) if attempt >= max_attempts => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: e,
                    })
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug)]
    struct Flaky {
        retryable: bool,
    }

    impl std::fmt::Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "flaky (retryable: {})", self.retryable)
        }
    }

    impl Retryable for Flaky {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (1..policy.max_attempts)
            .map(|n| policy.delay_after(n).as_secs())
            .collect();
        assert_eq!(delays, vec![5, 5, 8, 15]);
    }

    #[test]
    fn test_schedule_bounded_and_non_decreasing() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 1..=64 {
            let delay = policy.delay_after(attempt);
            assert!(delay >= policy.min_wait && delay <= policy.max_wait);
            assert!(delay >= previous);
            previous = delay;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = RetryPolicy::default()
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(Flaky { retryable: true })
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_exactly_max_attempts() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), _> = RetryPolicy::default()
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Flaky { retryable: true }) }
            })
            .await;

        match result {
            Err(RetryError::Exhausted { attempts, .. }) => assert_eq!(attempts, 5),
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // 5 + 5 + 8 + 15, no wait after the last attempt
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(33) && elapsed < Duration::from_secs(34));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_stops_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::default()
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Flaky { retryable: false }) }
            })
            .await;

        assert!(matches!(result, Err(RetryError::Permanent(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_policy_from_config() {
        let config = RetryConfig {
            max_attempts: 3,
            multiplier_secs: 0.5,
            min_wait_secs: 1.0,
            max_wait_secs: 4.0,
        };
        let policy = RetryPolicy::try_from(&config).unwrap();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(4), Duration::from_secs(4));
    }

    #[test]
    fn test_policy_rejects_unrepresentable_waits() {
        let config: crate::config::Config =
            serde_yaml::from_str("retry:\n  multiplier_secs: .inf\n").unwrap();
        let err = RetryPolicy::try_from(&config.retry).unwrap_err();
        assert!(err.to_string().contains("retry.multiplier_secs"));

        for bad in [1e30, -1.0, f64::NAN] {
            let config = RetryConfig {
                max_wait_secs: bad,
                ..RetryConfig::default()
            };
            assert!(RetryPolicy::try_from(&config).is_err());
        }
    }

    #[test]
    fn test_policy_max_wait_never_below_min_wait() {
        let config = RetryConfig {
            min_wait_secs: 5.0,
            max_wait_secs: 1.0,
            ..RetryConfig::default()
        };
        let policy = RetryPolicy::try_from(&config).unwrap();
        assert_eq!(policy.max_wait, Duration::from_secs(5));
    }
}
