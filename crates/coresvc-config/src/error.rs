//! Configuration error taxonomy. Every failure is collected rather than
//! short-circuited, so a single run surfaces every missing or malformed
//! field at once.

use std::fmt;

/// One field-level configuration problem. `message` never contains a
/// secret value, even when the field itself is a secret (`JWT_SECRET`,
/// `DATABASE_URL`) — only the fact that it's invalid is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file {path:?} could not be read: {message}")]
    FileUnreadable { path: String, message: String },

    #[error("configuration file {path:?} could not be parsed: {message}")]
    FileMalformed { path: String, message: String },

    #[error("configuration invalid: {}", format_violations(.0))]
    Validation(Vec<FieldError>),
}

fn format_violations(violations: &[FieldError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
