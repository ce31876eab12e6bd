//! Circuit breaker, retrier, timeout, and bulkhead primitives, sharing a
//! stable `RES-00x` error-code taxonomy. No transport and no domain types —
//! this crate composes around any fallible async operation.

pub mod bulkhead;
pub mod circuit_breaker;
pub mod error;
pub mod retrier;
pub mod timeout;

pub use bulkhead::{Bulkhead, BulkheadConfig, BulkheadMetrics};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState};
pub use error::ResilienceError;
pub use retrier::{Retrier, RetrierConfig};
pub use timeout::Timeout;

#[cfg(test)]
use tokio_test as _;
