//! User repository port.
//!
//! # Design Rules
//!
//! - No `sqlx` types in signatures.
//! - CRUD-only: list, get, insert. Pagination/search logic belongs to the
//!   use case, not here.

use async_trait::async_trait;

use super::{Querier, RepositoryError};
use crate::domain::id::Id;
use crate::domain::pagination::ListParams;
use crate::domain::user::User;

/// Repository for user persistence operations.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Returns [`RepositoryError::AlreadyExists`] if the
    /// email is already registered.
    async fn insert(&self, q: &mut dyn Querier, user: &User) -> Result<(), RepositoryError>;

    /// Fetch a user by id, or `Ok(None)` if it doesn't exist.
    async fn find_by_id(
        &self,
        q: &mut dyn Querier,
        id: Id,
    ) -> Result<Option<User>, RepositoryError>;

    /// Whether a user with this (already-lowercased) email exists.
    async fn exists_by_email(
        &self,
        q: &mut dyn Querier,
        email: &str,
    ) -> Result<bool, RepositoryError>;

    /// List users page by page, returning the page and the total row count.
    async fn list(
        &self,
        q: &mut dyn Querier,
        params: ListParams,
    ) -> Result<(Vec<User>, i64), RepositoryError>;
}
