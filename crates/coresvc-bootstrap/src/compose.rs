//! Infrastructure wiring. This module is the only place concrete adapter
//! types (`coresvc-db`'s repositories, pool, idempotency store) are named —
//! everything downstream sees only the port traits they implement.

use std::sync::Arc;

use anyhow::Context as _;
use coresvc_config::{AuditRedactEmail, Config, IdempotencyFailureMode};
use coresvc_core::ports::audit_repository::AuditRepository;
use coresvc_core::ports::clock::SystemClock;
use coresvc_core::ports::idempotency_store::{FailureMode, IdempotencyStore};
use coresvc_core::ports::tx_manager::TxManager;
use coresvc_core::ports::user_repository::UserRepository;
use coresvc_core::{CreateUser, GetUser, ListUsers};
use coresvc_db::{build_pool, pool_metrics, PgAuditRepository, PgIdempotencyStore, PgTxManager, PgUserRepository};
use coresvc_http::{HttpContext, Metrics, PoolMetricsSnapshot, RateLimiter, ShutdownState};
use sqlx::PgPool;

/// Everything `main`/the server loop needs: the assembled HTTP context, plus
/// the raw pool so the shutdown coordinator can close it last.
pub struct Composed {
    pub pool: PgPool,
    pub context: Arc<HttpContext>,
}

pub async fn compose(config: Config) -> anyhow::Result<Composed> {
    let pool = build_pool(
        &config.database_url,
        config.db_pool.min_conns,
        config.db_pool.max_conns,
        config.db_pool.max_lifetime,
    )
    .await
    .context("failed to build database connection pool")?;

    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new());
    let audit: Arc<dyn AuditRepository> = Arc::new(PgAuditRepository::new());
    let tx: Arc<dyn TxManager> = Arc::new(PgTxManager::new(pool.clone()));
    let clock = Arc::new(SystemClock);

    let email_redaction = match config.audit_redact_email {
        AuditRedactEmail::Full => coresvc_core::EmailRedaction::Full,
        AuditRedactEmail::Partial => coresvc_core::EmailRedaction::Partial,
    };
    let create_user = CreateUser::new(users.clone(), audit, tx.clone(), clock, email_redaction);
    let get_user = GetUser::new(users.clone());
    let list_users = ListUsers::new(users);

    let failure_mode = match config.idempotency_fail_mode {
        IdempotencyFailureMode::Open => FailureMode::FailOpen,
        IdempotencyFailureMode::Closed => FailureMode::FailClosed,
    };
    let idempotency: Arc<dyn IdempotencyStore> = Arc::new(PgIdempotencyStore::new(pool.clone(), failure_mode));

    let rate_limiter = RateLimiter::new(config.rate_limit_rps, config.rate_limit_burst);
    let shutdown = Arc::new(ShutdownState::new());
    let metrics = Metrics::new();
    let pool_metrics_fn = pool_metrics_reader(pool.clone(), config.db_pool.max_conns);

    let context = Arc::new(HttpContext {
        config,
        tx,
        create_user,
        get_user,
        list_users,
        idempotency,
        metrics,
        rate_limiter,
        shutdown,
        pool_metrics: Some(pool_metrics_fn),
    });

    Ok(Composed { pool, context })
}

/// `coresvc-http` never depends on `sqlx`, so the pool-gauge reader it polls
/// is injected as a plain closure rather than a trait it would need a new
/// port for. Wait-count and cumulative wait duration aren't tracked by
/// `sqlx`'s pool and are left at zero here, as noted in `coresvc-db::pool`.
fn pool_metrics_reader(pool: PgPool, max_open: u32) -> Arc<dyn Fn() -> PoolMetricsSnapshot + Send + Sync> {
    Arc::new(move || {
        let snapshot = pool_metrics(&pool, max_open);
        PoolMetricsSnapshot {
            total: snapshot.total,
            idle: snapshot.idle,
            in_use: snapshot.in_use,
            max_open: snapshot.max_open,
            wait_count: 0,
            wait_duration_secs: 0.0,
        }
    })
}
