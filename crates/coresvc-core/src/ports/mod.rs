//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the application expects from infrastructure.
//! They use only domain types plus the opaque [`Querier`] marker.
//!
//! # Design Rules
//!
//! - No `sqlx` (or any other driver) types in any signature.
//! - Traits are minimal and CRUD-focused — one trait per entity, no
//!   universal generic repository.
//! - `Querier` is intentionally opaque: infra adapters own the concrete
//!   connection/transaction type and downcast it from `&mut dyn Querier`.

pub mod audit_repository;
pub mod clock;
pub mod idempotency_store;
pub mod querier;
pub mod tx_manager;
pub mod user_repository;

pub use audit_repository::AuditRepository;
pub use clock::Clock;
pub use idempotency_store::{FailureMode, IdempotencyOutcome, IdempotencyRecord, IdempotencyStore};
pub use querier::Querier;
pub use tx_manager::{TxManager, TxManagerExt};
pub use user_repository::UserRepository;

use thiserror::Error;

/// Error surfaced by repository implementations. Repositories wrap driver
/// errors with a consistent operation tag but never leak SQL fragments.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
