//! Deadline wrapper around `tokio::time::timeout`.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::ResilienceError;

pub struct Timeout {
    name: String,
    duration: Duration,
}

impl Timeout {
    #[must_use]
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }

    /// Run `operation`, racing it against the configured deadline. Records
    /// the observed duration with an outcome label via `tracing`, per the
    /// spec's "records duration with outcome labels".
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, ResilienceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started = std::time::Instant::now();
        match tokio::time::timeout(self.duration, operation()).await {
            Ok(Ok(value)) => {
                debug!(timeout = %self.name, elapsed = ?started.elapsed(), outcome = "ok");
                Ok(value)
            }
            Ok(Err(err)) => {
                debug!(timeout = %self.name, elapsed = ?started.elapsed(), outcome = "error");
                Err(ResilienceError::Operation(err))
            }
            Err(_) => {
                debug!(timeout = %self.name, elapsed = ?started.elapsed(), outcome = "timeout");
                Err(ResilienceError::TimeoutExceeded(self.duration))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_fast_success() {
        let timeout = Timeout::new("test", Duration::from_millis(50));
        let result = timeout.call(|| async { Ok::<_, &str>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn times_out_slow_operations() {
        let timeout = Timeout::new("test", Duration::from_millis(5));
        let result = timeout
            .call(|| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, &str>(())
            })
            .await;
        assert!(matches!(result, Err(ResilienceError::TimeoutExceeded(_))));
    }
}
