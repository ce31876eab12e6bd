//! Connection pool construction and the metrics snapshot read by the
//! bootstrap's internal `/metrics` handler.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to connect to database: {0}")]
    Connect(String),
}

/// Build the process-wide connection pool. Called once at bootstrap;
/// returns a pool rather than a type implementing `Querier` directly —
/// callers wrap it in [`crate::querier::PgQuerier::Pool`] at the point of
/// use.
pub async fn build_pool(
    database_url: &str,
    min_conns: u32,
    max_conns: u32,
    max_lifetime: Duration,
) -> Result<PgPool, PoolError> {
    PgPoolOptions::new()
        .min_connections(min_conns)
        .max_connections(max_conns)
        .max_lifetime(Some(max_lifetime))
        .connect(database_url)
        .await
        .map_err(|e| PoolError::Connect(e.to_string()))
}

/// Readiness probe: a trivial round trip, used by the `/ready` handler's
/// database check.
pub async fn ping(pool: &PgPool) -> Result<(), PoolError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| PoolError::Connect(e.to_string()))
}

/// Snapshot of pool state: total, in-use, idle, and max-open, as closely as
/// `sqlx`'s pool introspection allows. `sqlx` doesn't track wait-count or
/// cumulative wait duration itself; the bootstrap's metrics snapshot type
/// carries those two fields separately, sourced from the timeout/bulkhead
/// primitives around pool acquisition instead.
#[derive(Debug, Clone, Copy)]
pub struct PoolMetrics {
    pub total: u32,
    pub idle: u32,
    pub in_use: u32,
    pub max_open: u32,
}

#[must_use]
pub fn pool_metrics(pool: &PgPool, max_open: u32) -> PoolMetrics {
    let total = pool.size();
    let idle = u32::try_from(pool.num_idle()).unwrap_or(u32::MAX);
    PoolMetrics {
        total,
        idle,
        in_use: total.saturating_sub(idle),
        max_open,
    }
}
