//! Postgres transaction manager: the sole implementation of
//! `coresvc_core::ports::TxManager`.

use std::any::Any;
use std::time::Duration;

use async_trait::async_trait;
use coresvc_core::application::error::AppError;
use coresvc_core::ports::querier::Querier;
use coresvc_core::ports::tx_manager::{BoxFuture, TxManager};
use coresvc_resilience::{Retrier, RetrierConfig, ResilienceError};
use sqlx::PgPool;

use crate::querier::PgQuerier;

/// Retries the whole transaction (not a single statement) up to 3 times on
/// a serialization failure or deadlock. Standard Postgres advice for
/// `SERIALIZABLE` isolation is to retry the entire transaction body, since
/// one statement succeeding a second time proves nothing about the
/// statements around it.
fn retry_config() -> RetrierConfig {
    RetrierConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(200),
        multiplier: 2.0,
    }
}

pub struct PgTxManager {
    pool: PgPool,
}

impl PgTxManager {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_once(
        &self,
        f: &(dyn for<'q> Fn(&'q mut dyn Querier) -> BoxFuture<'q, Result<Box<dyn Any + Send>, AppError>>
              + Send
              + Sync),
    ) -> Result<Box<dyn Any + Send>, AppError> {
        let tx = self.pool.begin().await.map_err(AppError::internal)?;
        let mut querier = PgQuerier::Tx(tx);

        let result = f(&mut querier).await;

        let PgQuerier::Tx(tx) = querier else {
            unreachable!("with_tx always constructs the Tx variant")
        };

        match result {
            Ok(value) => {
                tx.commit().await.map_err(AppError::internal)?;
                Ok(value)
            }
            Err(err) => {
                // Best-effort: if rollback fails (connection already gone),
                // the original error is still the one worth surfacing.
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }
}

#[async_trait]
impl TxManager for PgTxManager {
    async fn with_tx_erased<'a>(
        &'a self,
        f: Box<
            dyn for<'q> Fn(&'q mut dyn Querier) -> BoxFuture<'q, Result<Box<dyn Any + Send>, AppError>>
                + Send
                + Sync
                + 'a,
        >,
    ) -> Result<Box<dyn Any + Send>, AppError> {
        let retrier = Retrier::new("pg_transaction", retry_config());
        retrier
            .call(|| self.run_once(f.as_ref()), AppError::is_retryable_conflict)
            .await
            .map_err(|err| match err {
                ResilienceError::RetriesExhausted { source, .. } | ResilienceError::Operation(source) => source,
                // A transaction body never produces the circuit/bulkhead/timeout
                // variants — those belong to `coresvc-resilience`'s other
                // primitives, not this manager.
                other => AppError::internal(other),
            })
    }
}
