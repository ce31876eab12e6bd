//! Domain, application, and port definitions for the service core.
//!
//! This crate contains no transport (axum), no SQL driver types, and no
//! process-level concerns. Adapters depend on it; it depends on nothing
//! outward.

pub mod application;
pub mod domain;
pub mod ports;
pub mod use_cases;

pub use domain::audit::{AuditEvent, EmailRedaction, NewAuditEvent};
pub use domain::error::DomainError;
pub use domain::id::Id;
pub use domain::pagination::ListParams;
pub use domain::user::{NewUser, User};

pub use application::auth::{AuthContext, Permission, Role};
pub use application::error::AppError;

pub use use_cases::{CreateUser, GetUser, ListUsers};

#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;
