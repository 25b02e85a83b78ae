//! Bounded retry with backoff for outbound calls
//!
//! A policy value passed to each call site. The caller supplies the
//! retryable-error predicate so venue rejections are never replayed.

use crate::config::RetryConfig;
use std::future::Future;
use std::time::Duration;

/// Retry schedule: bounded attempts with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// A policy that tries exactly once
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    fn delay(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay.saturating_mul(1 << attempt.min(16));
        backoff.min(self.max_delay)
    }

    /// Run `op` until it succeeds, the error is not retryable, or attempts
    /// run out. The last error is returned as-is.
    pub async fn run<T, E, Op, Fut, Pred>(&self, mut op: Op, retryable: Pred) -> Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Pred: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if retryable(&e) && attempt + 1 < self.max_attempts => {
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transient error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(1),
            Duration::from_millis(2),
        )
    }

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = fast_policy(5)
            .run(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(7) }
                },
                |_| true,
            )
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = fast_policy(5)
            .run(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err("transient".to_string())
                        } else {
                            Ok(9)
                        }
                    }
                },
                |_| true,
            )
            .await;
        assert_eq!(result.unwrap(), 9);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = fast_policy(3)
            .run(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("still down".to_string()) }
                },
                |_| true,
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = fast_policy(5)
            .run(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("rejected".to_string()) }
                },
                |e| e != "rejected",
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy = RetryPolicy::new(
            10,
            Duration::from_millis(100),
            Duration::from_millis(500),
        );
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(5), Duration::from_millis(500));
    }
}
