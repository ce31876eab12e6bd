//! HTTP adapter: request pipeline, RFC 7807 error rendering, strict JSON
//! decoding, JWT authentication, and the route handlers that call into
//! `coresvc-core`'s use cases. Holds no `sqlx` dependency of its own — the
//! transaction manager and idempotency store are consumed purely through
//! their `coresvc-core` port traits.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{fixed_problem, problem_for, ProblemResponse};
pub use metrics::{Metrics, PoolMetricsSnapshot};
pub use middleware::rate_limit::RateLimiter;
pub use middleware::real_ip::TrustProxy;
pub use middleware::shutdown_guard::ShutdownState;
pub use routes::{internal_router, public_router};
pub use state::{AppState, HttpContext};
