//! Domain error taxonomy.
//!
//! `DomainError` is raised by entities and their validation; it is never
//! constructed at the transport boundary. `Code` is the stable,
//! externally-visible identifier — additions are allowed, renames are not.

use thiserror::Error;

/// A single field validation failure, collected rather than returned
/// fail-fast so the transport layer can report every invalid field at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Domain-level error. Carries a stable UPPER_SNAKE code, a human-readable
/// message safe to surface to clients, and an optional internal cause kept
/// only for server-side diagnostics.
#[derive(Debug, Error)]
pub enum DomainError {
    /// One or more fields failed validation.
    #[error("validation failed")]
    Validation { violations: Vec<FieldViolation> },

    /// The requested entity does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A uniqueness constraint (e.g. email) was violated.
    #[error("{0}")]
    Conflict(String),

    /// Storage or serialization failure detected at the domain boundary.
    #[error("internal error")]
    Internal {
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DomainError {
    /// Stable, UPPER_SNAKE error code used by the transport-layer registry.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::Validation { violations }
    }

    #[must_use]
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }
}
