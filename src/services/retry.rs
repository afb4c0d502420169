//! Retry policy with exponential backoff and jitter.

use crate::config::RetryConfig;
use crate::error::{AgentError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff policy injected into network clients.
///
/// Delay formula: min(max_delay, base * 2^attempt) + random jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base: Duration,
    max_delay: Duration,
    jitter_factor: f64,
}

impl RetryPolicy {
    /// Build a policy from configuration. Negative jitter is clamped to 0
    /// to keep the random range valid.
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: Duration::from_millis(config.base_ms),
            max_delay: Duration::from_millis(config.max_ms),
            jitter_factor: config.jitter.max(0.0),
        }
    }

    /// Total attempt budget, first try included.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retrying after the given zero-based attempt.
    ///
    /// A `retry_after` hint (e.g. from a 429 Retry-After header) overrides
    /// the computed delay for that attempt.
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint.min(self.max_delay);
        }

        let exp_delay = self.base.saturating_mul(2u32.saturating_pow(attempt));
        let capped = exp_delay.min(self.max_delay);

        let jitter_range = capped.as_secs_f64() * self.jitter_factor;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };

        Duration::from_secs_f64((capped.as_secs_f64() + jitter).max(0.0))
    }

    /// Run an operation under this policy.
    ///
    /// Retries only errors whose `is_retryable()` is true; anything else
    /// (authentication, malformed output) propagates immediately. Exhausting
    /// the budget surfaces `ServiceUnavailable`.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_err: Option<AgentError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let hint = match &last_err {
                    Some(AgentError::RateLimited {
                        retry_after_secs: Some(secs),
                    }) => Some(Duration::from_secs(*secs)),
                    _ => None,
                };
                let delay = self.delay(attempt - 1, hint);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!(attempt, error = %e, "transient failure");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(AgentError::ServiceUnavailable(format!(
            "gave up after {} attempts: {}",
            self.max_attempts,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(base_ms: u64, max_ms: u64, jitter: f64, attempts: u32) -> RetryPolicy {
        RetryPolicy::new(&RetryConfig {
            max_attempts: attempts,
            base_ms,
            max_ms,
            jitter,
        })
    }

    // =========================================================================
    // Delay curve
    // =========================================================================

    #[test]
    fn test_delay_increases_exponentially() {
        let p = policy(100, 60_000, 0.0, 3);
        assert_eq!(p.delay(0, None), Duration::from_millis(100));
        assert_eq!(p.delay(1, None), Duration::from_millis(200));
        assert_eq!(p.delay(2, None), Duration::from_millis(400));
        assert_eq!(p.delay(3, None), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_caps_at_max() {
        let p = policy(100, 500, 0.0, 3);
        assert_eq!(p.delay(10, None), Duration::from_millis(500));
    }

    #[test]
    fn test_retry_after_hint_overrides_backoff() {
        let p = policy(100, 60_000, 0.0, 3);
        assert_eq!(p.delay(0, Some(Duration::from_secs(7))), Duration::from_secs(7));
    }

    #[test]
    fn test_retry_after_hint_still_capped() {
        let p = policy(100, 2_000, 0.0, 3);
        assert_eq!(
            p.delay(0, Some(Duration::from_secs(120))),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let p = policy(10_000, 60_000, 0.2, 3);
        let delay = p.delay(0, None).as_secs_f64();
        // Base is 10s with ±20% jitter, so [8, 12].
        assert!((8.0..=12.0).contains(&delay), "delay was {delay}");
    }

    #[test]
    fn test_negative_jitter_clamped() {
        let p = policy(1_000, 60_000, -0.5, 3);
        assert_eq!(p.delay(0, None), Duration::from_millis(1_000));
    }

    #[test]
    fn test_attempt_budget_floor_is_one() {
        let p = policy(100, 1_000, 0.0, 0);
        assert_eq!(p.max_attempts(), 1);
    }

    // =========================================================================
    // run()
    // =========================================================================

    #[tokio::test]
    async fn test_run_succeeds_after_transient_failures() {
        let p = policy(1, 2, 0.0, 3);
        let calls = AtomicU32::new(0);

        let result = p
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(AgentError::ServiceUnavailable("flaky".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_exhausts_budget() {
        let p = policy(1, 2, 0.0, 3);
        let calls = AtomicU32::new(0);

        let err = p
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(AgentError::ServiceUnavailable("down".into())) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ServiceUnavailable(_)));
        // Never exceeds the configured attempt count.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_does_not_retry_fatal_errors() {
        let p = policy(1, 2, 0.0, 5);
        let calls = AtomicU32::new(0);

        let err = p
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(AgentError::Authentication("bad key".into())) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Authentication(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_rate_limit_exhaustion_becomes_service_unavailable() {
        let p = policy(1, 2, 0.0, 2);

        let err = p
            .run(|| async {
                Err::<u32, _>(AgentError::RateLimited {
                    retry_after_secs: None,
                })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ServiceUnavailable(_)));
    }
}
