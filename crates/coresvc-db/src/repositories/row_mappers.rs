//! Row ↔ domain-entity conversions. Kept separate from the repository
//! `impl` blocks so the SQL column list and the mapping logic have one
//! home each.

use chrono::{DateTime, Utc};
use coresvc_core::domain::audit::AuditEvent;
use coresvc_core::domain::id::Id;
use coresvc_core::domain::user::User;
use coresvc_core::ports::RepositoryError;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

pub const USER_SELECT_COLUMNS: &str =
    "id, email, first_name, last_name, created_at, updated_at";

pub fn row_to_user(row: &PgRow) -> Result<User, RepositoryError> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let email: String = row
        .try_get("email")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let first_name: String = row
        .try_get("first_name")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let last_name: String = row
        .try_get("last_name")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

    Ok(User {
        id: Id::from_uuid(id),
        email,
        first_name,
        last_name,
        created_at,
        updated_at,
    })
}

pub const AUDIT_SELECT_COLUMNS: &str =
    "id, event_type, actor_id, entity_type, entity_id, payload, timestamp, request_id";

pub fn row_to_audit_event(row: &PgRow) -> Result<AuditEvent, RepositoryError> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let event_type: String = row
        .try_get("event_type")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let actor_id: Option<Uuid> = row
        .try_get("actor_id")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let entity_type: String = row
        .try_get("entity_type")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let entity_id: Uuid = row
        .try_get("entity_id")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let payload: serde_json::Value = row
        .try_get("payload")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let timestamp: DateTime<Utc> = row
        .try_get("timestamp")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let request_id: String = row
        .try_get("request_id")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

    Ok(AuditEvent {
        id: Id::from_uuid(id),
        event_type,
        actor_id: actor_id.map(Id::from_uuid),
        entity_type: leak_entity_type(&entity_type),
        entity_id: Id::from_uuid(entity_id),
        payload,
        timestamp,
        request_id,
    })
}

/// `AuditEvent::entity_type` is `&'static str` in the domain model (it's
/// always one of a small fixed set of compile-time entity names); rows
/// read back from storage compare against that fixed set rather than
/// leaking arbitrary strings as `'static`.
fn leak_entity_type(value: &str) -> &'static str {
    match value {
        "user" => "user",
        other => {
            tracing::warn!(entity_type = other, "unrecognized audit entity_type in storage");
            "unknown"
        }
    }
}
