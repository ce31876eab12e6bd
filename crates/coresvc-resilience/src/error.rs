//! Shared error taxonomy for the resilience primitives. Every variant
//! carries a stable `RES-00x` code so callers can match on it regardless of
//! which primitive produced it.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResilienceError<E> {
    #[error("circuit breaker open")]
    CircuitOpen,

    #[error("bulkhead at capacity")]
    BulkheadFull,

    #[error("operation exceeded deadline of {0:?}")]
    TimeoutExceeded(Duration),

    #[error("exhausted {attempts} retry attempts")]
    RetriesExhausted { attempts: u32, source: E },

    #[error(transparent)]
    Operation(E),
}

impl<E> ResilienceError<E> {
    /// Stable UPPER_SNAKE-with-dash code (the `RES-00x` taxonomy), surfaced
    /// as 503 by the transport layer's outer error translation.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::CircuitOpen => "RES-001",
            Self::BulkheadFull => "RES-002",
            Self::TimeoutExceeded(_) => "RES-003",
            Self::RetriesExhausted { .. } => "RES-004",
            Self::Operation(_) => "RES-000",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_the_spec_taxonomy() {
        assert_eq!(ResilienceError::<()>::CircuitOpen.code(), "RES-001");
        assert_eq!(ResilienceError::<()>::BulkheadFull.code(), "RES-002");
        assert_eq!(
            ResilienceError::<()>::TimeoutExceeded(Duration::from_secs(1)).code(),
            "RES-003"
        );
        assert_eq!(
            ResilienceError::<()>::RetriesExhausted {
                attempts: 3,
                source: ()
            }
            .code(),
            "RES-004"
        );
    }
}
