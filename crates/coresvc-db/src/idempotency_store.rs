//! Postgres-backed idempotency store: `setNX`-style atomic reservation via
//! `INSERT ... ON CONFLICT DO NOTHING`, overwritten on completion.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use coresvc_core::ports::idempotency_store::{
    FailureMode, IdempotencyError, IdempotencyOutcome, IdempotencyRecord, IdempotencyStore,
};
use sqlx::{PgPool, Row};

pub struct PgIdempotencyStore {
    pool: PgPool,
    failure_mode: FailureMode,
}

impl PgIdempotencyStore {
    #[must_use]
    pub fn new(pool: PgPool, failure_mode: FailureMode) -> Self {
        Self { pool, failure_mode }
    }
}

#[async_trait]
impl IdempotencyStore for PgIdempotencyStore {
    async fn try_begin(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<IdempotencyOutcome, IdempotencyError> {
        let expires_at = chrono::Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_default();

        let inserted = sqlx::query(
            "INSERT INTO idempotency_keys (key, status, expires_at) \
             VALUES ($1, 'in_flight', $2) \
             ON CONFLICT (key) DO NOTHING",
        )
        .bind(key)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| IdempotencyError::Unavailable(e.to_string()))?;

        if inserted.rows_affected() == 1 {
            return Ok(IdempotencyOutcome::Begun);
        }

        let row = sqlx::query(
            "SELECT status, status_code, headers, body, stored_at, ttl_secs \
             FROM idempotency_keys WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdempotencyError::Unavailable(e.to_string()))?;

        let Some(row) = row else {
            // Raced with a concurrent completion that also expired/cleared
            // the row between our INSERT and this SELECT; treat as a fresh
            // reservation attempt by the caller.
            return Ok(IdempotencyOutcome::InFlight);
        };

        let status: String = row
            .try_get("status")
            .map_err(|e| IdempotencyError::Unavailable(e.to_string()))?;

        if status == "in_flight" {
            return Ok(IdempotencyOutcome::InFlight);
        }

        let status_code: i32 = row
            .try_get("status_code")
            .map_err(|e| IdempotencyError::Unavailable(e.to_string()))?;
        let headers_json: serde_json::Value = row
            .try_get("headers")
            .map_err(|e| IdempotencyError::Unavailable(e.to_string()))?;
        let body: Vec<u8> = row
            .try_get("body")
            .map_err(|e| IdempotencyError::Unavailable(e.to_string()))?;
        let stored_at = row
            .try_get("stored_at")
            .map_err(|e| IdempotencyError::Unavailable(e.to_string()))?;
        let ttl_secs: i64 = row
            .try_get("ttl_secs")
            .map_err(|e| IdempotencyError::Unavailable(e.to_string()))?;

        let headers: HashMap<String, String> =
            serde_json::from_value(headers_json).unwrap_or_default();

        Ok(IdempotencyOutcome::Completed(IdempotencyRecord {
            status_code: u16::try_from(status_code).unwrap_or(500),
            headers,
            body,
            stored_at,
            ttl: Duration::from_secs(u64::try_from(ttl_secs).unwrap_or(0)),
        }))
    }

    async fn complete(&self, key: &str, record: IdempotencyRecord) -> Result<(), IdempotencyError> {
        let headers_json = serde_json::to_value(&record.headers).unwrap_or_default();
        let expires_at = record.stored_at
            + chrono::Duration::from_std(record.ttl).unwrap_or_default();

        sqlx::query(
            "UPDATE idempotency_keys SET \
             status = 'completed', status_code = $2, headers = $3, body = $4, \
             stored_at = $5, ttl_secs = $6, expires_at = $7 \
             WHERE key = $1",
        )
        .bind(key)
        .bind(i32::from(record.status_code))
        .bind(headers_json)
        .bind(&record.body)
        .bind(record.stored_at)
        .bind(i64::try_from(record.ttl.as_secs()).unwrap_or(i64::MAX))
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| IdempotencyError::Unavailable(e.to_string()))?;

        Ok(())
    }

    fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }
}
