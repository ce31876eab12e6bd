//! Postgres implementation of `AuditRepository`. Append-only: no update or
//! delete query exists for this table.

use async_trait::async_trait;
use coresvc_core::domain::audit::AuditEvent;
use coresvc_core::ports::RepositoryError;
use coresvc_core::ports::querier::Querier;
use coresvc_core::ports::audit_repository::AuditRepository;

use crate::errors::map_sqlx_error;
use crate::querier::{PgQuerier, with_executor};

pub struct PgAuditRepository;

impl PgAuditRepository {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PgAuditRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn insert(&self, q: &mut dyn Querier, event: &AuditEvent) -> Result<(), RepositoryError> {
        let q = PgQuerier::downcast_mut(q);
        with_executor!(q, exec => {
            sqlx::query(
                "INSERT INTO audit_events \
                 (id, event_type, actor_id, entity_type, entity_id, payload, timestamp, request_id) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(event.id.as_uuid())
            .bind(&event.event_type)
            .bind(event.actor_id.map(|id| id.as_uuid()))
            .bind(event.entity_type)
            .bind(event.entity_id.as_uuid())
            .bind(&event.payload)
            .bind(event.timestamp)
            .bind(&event.request_id)
            .execute(exec)
            .await
        })
        .map(|_| ())
        .map_err(map_sqlx_error)
    }
}
