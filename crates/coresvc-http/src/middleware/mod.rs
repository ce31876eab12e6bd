//! The ordered request pipeline: outer layers first, `/api/v1`-only layers
//! last. See `coresvc-http::routes` for where each layer is actually
//! attached — this module only defines the layers themselves.

pub mod auth_context_bridge;
pub mod body_limit;
pub mod idempotency;
pub mod jwt_auth;
pub mod logger;
pub mod metrics_layer;
pub mod rate_limit;
pub mod real_ip;
pub mod recoverer;
pub mod request_id;
pub mod security_headers;
pub mod shutdown_guard;
