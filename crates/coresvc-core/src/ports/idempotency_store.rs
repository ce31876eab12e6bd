//! Idempotency store port.
//!
//! At-most-one-effect POST semantics keyed by a client-supplied header:
//! `setNX`-style reservation, buffered completion, replay on repeat.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// A stored idempotent response, replayed verbatim on a repeat request.
#[derive(Debug, Clone)]
pub struct IdempotencyRecord {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub stored_at: DateTime<Utc>,
    pub ttl: Duration,
}

/// Result of attempting to reserve a key.
#[derive(Debug, Clone)]
pub enum IdempotencyOutcome {
    /// The key was new; the caller should process the request and call
    /// [`IdempotencyStore::complete`] when done.
    Begun,
    /// A completed record already exists; replay it.
    Completed(IdempotencyRecord),
    /// A reservation exists but has not been completed yet (another
    /// in-flight request holds it).
    InFlight,
}

/// What to do when the backing store itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Process the request normally; the at-most-one guarantee is relaxed
    /// for the duration of the outage.
    FailOpen,
    /// Surface the error so the client retries rather than risk a
    /// duplicate side effect.
    FailClosed,
}

#[derive(Debug, Error)]
pub enum IdempotencyError {
    #[error("idempotency store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Attempt to reserve `key`. Atomic: concurrent callers racing on the
    /// same key never both observe [`IdempotencyOutcome::Begun`].
    async fn try_begin(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<IdempotencyOutcome, IdempotencyError>;

    /// Store the final response for a key previously reserved via
    /// `try_begin`.
    async fn complete(&self, key: &str, record: IdempotencyRecord) -> Result<(), IdempotencyError>;

    /// The configured failure mode, consulted by the middleware when
    /// `try_begin`/`complete` return an error.
    fn failure_mode(&self) -> FailureMode;
}
