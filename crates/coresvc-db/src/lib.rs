//! PostgreSQL adapter: connection pool, the `Querier`/`TxManager`
//! implementation, repositories, and the idempotency store. Depends on
//! `coresvc-core`'s ports; nothing here is visible to the transport layer
//! except through those port traits.

pub mod errors;
pub mod idempotency_store;
pub mod pool;
pub mod querier;
pub mod repositories;
pub mod tx_manager;

pub use idempotency_store::PgIdempotencyStore;
pub use pool::{PoolError, PoolMetrics, build_pool, ping, pool_metrics};
pub use querier::PgQuerier;
pub use repositories::{PgAuditRepository, PgUserRepository};
pub use tx_manager::PgTxManager;

#[cfg(test)]
use tokio_test as _;
