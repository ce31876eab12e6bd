//! Audit event repository port.

use async_trait::async_trait;

use super::{Querier, RepositoryError};
use crate::domain::audit::AuditEvent;

/// Repository for audit event persistence. Events are append-only: there is
/// no update or delete operation by design.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert(&self, q: &mut dyn Querier, event: &AuditEvent) -> Result<(), RepositoryError>;
}
