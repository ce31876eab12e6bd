//! Circuit breaker: closed → open → half-open state machine over a rolling
//! failure window.

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ResilienceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures within the rolling window before the circuit
    /// opens.
    pub failure_threshold: u32,
    /// How long the circuit stays open before probing with a half-open
    /// trial call.
    pub open_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
        }
    }
}

/// Point-in-time snapshot, read by the bootstrap's metrics exposition.
/// `state_gauge` is 1 while `Open`, 0 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerMetrics {
    pub state_gauge: u8,
    pub consecutive_failures: u32,
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        CircuitBreakerMetrics {
            state_gauge: u8::from(inner.state == CircuitState::Open),
            consecutive_failures: inner.consecutive_failures,
        }
    }

    fn before_call(&self) -> Result<bool, ()> {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::Closed => Ok(false),
            CircuitState::HalfOpen => Ok(true),
            CircuitState::Open => {
                let opened_at = inner.opened_at.expect("open state always has opened_at");
                if opened_at.elapsed() >= self.config.open_duration {
                    inner.state = CircuitState::HalfOpen;
                    debug!(circuit = %self.name, "circuit breaker transitioning to half-open");
                    Ok(true)
                } else {
                    Err(())
                }
            }
        }
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        inner.consecutive_failures = 0;
        if inner.state != CircuitState::Closed {
            debug!(circuit = %self.name, "circuit breaker closing after successful probe");
        }
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
    }

    fn on_failure(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        inner.consecutive_failures += 1;
        if inner.state == CircuitState::HalfOpen
            || inner.consecutive_failures >= self.config.failure_threshold
        {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            debug!(circuit = %self.name, "circuit breaker opening");
        }
    }

    /// Run `operation` through the breaker. Rejects immediately with
    /// [`ResilienceError::CircuitOpen`] while the circuit is open and its
    /// cooldown hasn't elapsed.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, ResilienceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if self.before_call().is_err() {
            return Err(ResilienceError::CircuitOpen);
        }

        match operation().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                self.on_failure();
                Err(ResilienceError::Operation(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: threshold,
            open_duration: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new("test", config(2));
        for _ in 0..2 {
            let _ = breaker.call(|| async { Err::<(), &str>("boom") }).await;
        }
        assert_eq!(breaker.metrics().state_gauge, 1);

        let result = breaker.call(|| async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(ResilienceError::CircuitOpen)));
    }

    #[tokio::test]
    async fn half_opens_after_cooldown_and_closes_on_success() {
        let breaker = CircuitBreaker::new("test", config(1));
        let _ = breaker.call(|| async { Err::<(), &str>("boom") }).await;
        assert_eq!(breaker.metrics().state_gauge, 1);

        tokio::time::sleep(Duration::from_millis(30)).await;

        let result = breaker.call(|| async { Ok::<_, &str>(()) }).await;
        assert!(result.is_ok());
        assert_eq!(breaker.metrics().state_gauge, 0);
    }
}
