//! Shared application state threaded through every handler and middleware
//! via axum's `State` extractor. Built once at bootstrap, read-only
//! thereafter except for the metrics registry and shutdown counters, which
//! are internally synchronized.

use std::sync::Arc;

use coresvc_config::Config;
use coresvc_core::ports::idempotency_store::IdempotencyStore;
use coresvc_core::ports::tx_manager::TxManager;
use coresvc_core::{CreateUser, GetUser, ListUsers};

use crate::metrics::{Metrics, PoolMetricsSnapshot};
use crate::middleware::rate_limit::RateLimiter;
use crate::middleware::shutdown_guard::ShutdownState;

pub struct HttpContext {
    pub config: Config,
    pub tx: Arc<dyn TxManager>,
    pub create_user: CreateUser,
    pub get_user: GetUser,
    pub list_users: ListUsers,
    pub idempotency: Arc<dyn IdempotencyStore>,
    pub metrics: Metrics,
    pub rate_limiter: RateLimiter,
    pub shutdown: Arc<ShutdownState>,
    /// Reads the database pool's current gauges, supplied by the
    /// bootstrap so this crate never needs an `sqlx` dependency of its
    /// own. `None` only in tests that don't wire a pool.
    pub pool_metrics: Option<Arc<dyn Fn() -> PoolMetricsSnapshot + Send + Sync>>,
}

pub type AppState = Arc<HttpContext>;
