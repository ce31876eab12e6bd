//! Layered configuration loader: file → env overrides → `<NAME>_FILE`
//! secret-file variants → built-in defaults, with aggregated validation
//! and a redacted projection safe for logs.

pub mod env;
pub mod error;
pub mod loader;
pub mod redact;
pub mod schema;

pub use error::{ConfigError, FieldError};
pub use redact::RedactedConfig;
pub use schema::{
    AuditRedactEmail, Config, DbPoolConfig, Environment, IdempotencyFailureMode, LogLevel,
};

#[cfg(test)]
use tempfile as _;
