//! Exponential backoff retrier. A classifier closure decides which errors
//! are worth retrying; cancellation and deadline-exceeded shaped errors
//! must never be retried, so `RetrierConfig` doesn't special-case them
//! here — it's the caller's classifier that must return `false` for those,
//! same as any other non-retryable error.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::ResilienceError;

#[derive(Debug, Clone, Copy)]
pub struct RetrierConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetrierConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

pub struct Retrier {
    name: String,
    config: RetrierConfig,
}

impl Retrier {
    #[must_use]
    pub fn new(name: impl Into<String>, config: RetrierConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.config.initial_delay.as_secs_f64() * self.config.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(scaled).min(self.config.max_delay)
    }

    /// Run `operation`, retrying while `is_retryable` returns `true` for the
    /// error, up to `max_attempts` total attempts.
    pub async fn call<F, Fut, T, E>(
        &self,
        mut operation: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    let exhausted = attempt >= self.config.max_attempts;
                    if exhausted || !is_retryable(&err) {
                        return Err(ResilienceError::RetriesExhausted {
                            attempts: attempt,
                            source: err,
                        });
                    }
                    let delay = self.delay_for_attempt(attempt - 1);
                    debug!(retrier = %self.name, attempt, ?delay, "retrying after failure");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let retrier = Retrier::new(
            "test",
            RetrierConfig {
                max_attempts: 5,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                multiplier: 1.0,
            },
        );
        let calls = AtomicU32::new(0);
        let result = retrier
            .call(
                || async {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err("transient")
                    } else {
                        Ok(n)
                    }
                },
                |_| true,
            )
            .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn stops_retrying_for_non_retryable_errors() {
        let retrier = Retrier::new("test", RetrierConfig::default());
        let calls = AtomicU32::new(0);
        let result = retrier
            .call::<_, _, (), &str>(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("fatal")
                },
                |_| false,
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let retrier = Retrier::new(
            "test",
            RetrierConfig {
                max_attempts: 3,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                multiplier: 1.0,
            },
        );
        let calls = AtomicU32::new(0);
        let result = retrier
            .call::<_, _, (), &str>(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("boom")
                },
                |_| true,
            )
            .await;
        match result {
            Err(ResilienceError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
