//! Application-layer error taxonomy and its mapping from [`DomainError`].
//!
//! `AppError` is what use cases return. The transport layer turns it into
//! an RFC 7807 response via the code registry in `coresvc-http`; this crate
//! only owns the codes and the safe-to-display message/hint.

use thiserror::Error;

use crate::domain::error::{DomainError, FieldViolation};
use crate::ports::RepositoryError;

/// Application-layer error. `code()` is the stable, externally-visible
/// identifier; `message()` is always safe to show a client; `hint()` is
/// optional, user-facing guidance that must never leak internal detail.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation { violations: Vec<FieldViolation> },

    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{0}")]
    Conflict(String),

    #[error("email already registered")]
    EmailExists,

    #[error("request too large")]
    RequestTooLarge,

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("operation timed out")]
    Timeout,

    /// A resilience primitive (circuit breaker, bulkhead) refused the
    /// call outright. `code` is the stable `RES-00x` identifier from
    /// `coresvc-resilience`, carried straight through so the transport
    /// registry can map it to 503 instead of collapsing it into
    /// `INTERNAL_ERROR`.
    #[error("resilience primitive unavailable ({code})")]
    Unavailable { code: &'static str },

    #[error("internal error")]
    Internal {
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AppError {
    /// Stable UPPER_SNAKE code, the external contract consumed by the
    /// transport-layer problem-details registry.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::EmailExists => "EMAIL_EXISTS",
            Self::RequestTooLarge => "REQUEST_TOO_LARGE",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::Timeout => "TIMEOUT",
            Self::Unavailable { code } => code,
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub fn internal(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Internal {
            cause: Box::new(cause),
        }
    }

    /// Whether this error came from a database serialization/deadlock
    /// conflict and is worth retrying the whole transaction for. Consulted
    /// by `PgTxManager::with_tx` — never by use cases, which have no
    /// business inspecting the cause chain of an error they're about to
    /// propagate.
    #[must_use]
    pub fn is_retryable_conflict(&self) -> bool {
        match self {
            Self::Internal { cause } => cause
                .downcast_ref::<RepositoryError>()
                .is_some_and(|e| matches!(e, RepositoryError::Serialization(_))),
            _ => false,
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { violations } => Self::Validation { violations },
            DomainError::NotFound { entity } => Self::NotFound { entity },
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Internal { cause } => Self::Internal { cause },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_strings() {
        assert_eq!(AppError::Unauthorized.code(), "UNAUTHORIZED");
        assert_eq!(AppError::EmailExists.code(), "EMAIL_EXISTS");
        assert_eq!(
            AppError::NotFound { entity: "user" }.code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn unavailable_carries_the_resilience_code_through() {
        assert_eq!(AppError::Unavailable { code: "RES-001" }.code(), "RES-001");
    }

    #[test]
    fn domain_not_found_maps_to_app_not_found() {
        let domain_err = DomainError::not_found("user");
        let app_err: AppError = domain_err.into();
        assert_eq!(app_err.code(), "NOT_FOUND");
    }

    #[test]
    fn serialization_conflict_is_retryable() {
        let err = AppError::internal(RepositoryError::Serialization("conflict".to_string()));
        assert!(err.is_retryable_conflict());
        let other = AppError::internal(RepositoryError::Storage("disk full".to_string()));
        assert!(!other.is_retryable_conflict());
    }

    #[test]
    fn domain_validation_preserves_violations() {
        let violations = vec![FieldViolation::new("email", "must not be empty")];
        let domain_err = DomainError::validation(violations.clone());
        let app_err: AppError = domain_err.into();
        match app_err {
            AppError::Validation { violations: v } => assert_eq!(v, violations),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
