//! Retry with exponential backoff for remote capability calls.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::domain::{CancellationToken, DomainError};

/// Bounded retry policy applied uniformly to embedding and generation calls.
///
/// The delay before attempt `n + 1` is `base_delay * backoff_multiplier^(n - 1)`,
/// capped at `max_delay`. Only errors accepted by `retryable` are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
    pub retryable: fn(&DomainError) -> bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_retryable(mut self, predicate: fn(&DomainError) -> bool) -> Self {
        self.retryable = predicate;
        self
    }

    /// Backoff after the `failed_attempt`-th failure (1-based).
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(32) as i32;
        let factor = self.backoff_multiplier.powi(exponent);
        let delay = self.base_delay.as_secs_f64() * factor;
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error, or
    /// attempts run out. Cancellation is checked before every attempt and
    /// interrupts backoff sleeps.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut f: F,
    ) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(DomainError::Cancelled);
            }
            attempt += 1;

            let error = match f().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !(self.retryable)(&error) || attempt >= max_attempts {
                return Err(error);
            }

            let delay = self.delay_for(attempt);
            warn!(
                operation,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying after transient failure"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(DomainError::Cancelled),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(5),
            retryable: DomainError::is_transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts).with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_delay_grows_exponentially_and_caps() {
        let policy = RetryPolicy::new(10)
            .with_base_delay(Duration::from_millis(500))
            .with_backoff_multiplier(2.0)
            .with_max_delay(Duration::from_secs(5));

        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(5), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_retries_transient_until_exhausted() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = fast_policy(3)
            .run("test", &CancellationToken::new(), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::transient("rate limited"))
            })
            .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_fails_fast() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = fast_policy(5)
            .run("test", &CancellationToken::new(), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::permanent("invalid input"))
            })
            .await;

        assert!(matches!(result, Err(DomainError::Capability { transient: false, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let calls = &AtomicU32::new(0);
        let result = fast_policy(3)
            .run("test", &CancellationToken::new(), || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(DomainError::transient("timeout"))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_makes_no_call() {
        let token = CancellationToken::new();
        token.cancel();
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = fast_policy(3)
            .run("test", &token, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(DomainError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_backoff() {
        let token = CancellationToken::new();
        let policy = RetryPolicy::new(5).with_base_delay(Duration::from_secs(30));
        let calls = &AtomicU32::new(0);

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                token.cancel();
            })
        };

        let result: Result<(), _> = tokio::time::timeout(
            Duration::from_secs(2),
            policy.run("test", &token, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::transient("unavailable"))
            }),
        )
        .await
        .expect("cancellation should end the backoff sleep");

        canceller.await.unwrap();
        assert!(matches!(result, Err(DomainError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
