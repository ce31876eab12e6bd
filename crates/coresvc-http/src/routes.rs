//! Router construction: the public `/api/v1` router with its full ordered
//! middleware pipeline, and a separate internal router for
//! `/metrics`/`/health`/`/ready`. The two are never combined into one
//! router — `coresvc-bootstrap` binds each to its own listener, which is
//! what actually guarantees `/metrics` 404s on the public port.

use axum::http::StatusCode;
use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{health, metrics, users};
use crate::middleware::request_id::{MakeUuidRequestId, REQUEST_ID_HEADER};
use crate::middleware::security_headers::SecurityHeadersLayer;
use crate::middleware::{body_limit, idempotency, jwt_auth, logger, metrics_layer, rate_limit, real_ip, recoverer, shutdown_guard};
use crate::middleware::auth_context_bridge;
use crate::state::AppState;

/// Builds the `/api/v1`-scoped router: layers 9-12 of the pipeline, applied
/// innermost (closest to the handlers), nested under the outer layers 1-8
/// built by [`public_router`].
fn api_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", post(users::create).get(users::list))
        .route("/users/{id}", get(users::get))
        .layer(axum_middleware::from_fn_with_state(state.clone(), idempotency::enforce))
        .layer(axum_middleware::from_fn(auth_context_bridge::require))
        .layer(axum_middleware::from_fn_with_state(state.clone(), jwt_auth::authenticate))
        .layer(axum_middleware::from_fn_with_state(state, rate_limit::enforce))
}

/// Builds the public listener's router: the full 12-layer pipeline, outer
/// to inner, wrapping the `/api/v1` subrouter.
#[must_use]
pub fn public_router(state: AppState) -> Router {
    let max_request_size = state.config.max_request_size;

    Router::new()
        .nest("/api/v1", api_v1_router(state.clone()))
        .fallback(not_found)
        .layer(
            // Outermost first: SecurityHeaders, RequestID, Tracing, Metrics,
            // Logger, RealIP, BodyLimiter, Recoverer, ShutdownGuard. Each
            // `.layer()` call here wraps *outside* everything before it, so
            // this list reads top-to-bottom in the same order requests pass
            // through it.
            ServiceBuilder::new()
                .layer(SecurityHeadersLayer)
                .layer(SetRequestIdLayer::new(
                    REQUEST_ID_HEADER.parse().expect("static header name parses"),
                    MakeUuidRequestId,
                ))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(axum_middleware::from_fn(stamp_request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn_with_state(state.clone(), metrics_layer::observe))
                .layer(axum_middleware::from_fn_with_state(state.clone(), logger::log))
                .layer(axum_middleware::from_fn_with_state(state.clone(), real_ip::resolve))
                .layer(axum_middleware::from_fn_with_state(state.clone(), body_limit::enforce))
                .layer(RequestBodyLimitLayer::new(max_request_size))
                .layer(recoverer::layer())
                .layer(axum_middleware::from_fn_with_state(state.clone(), shutdown_guard::guard)),
        )
        .with_state(state)
}

/// `tower_http`'s `SetRequestIdLayer` stamps the `X-Request-ID` header but
/// has no concept of this crate's [`crate::middleware::request_id::RequestId`]
/// extension; this bridges the two so every layer after it can read a typed,
/// pre-validated request ID instead of re-parsing the header.
async fn stamp_request_id(request: axum::extract::Request, next: axum_middleware::Next) -> axum::response::Response {
    let request = crate::middleware::request_id::propagate(request).await;
    next.run(request).await
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Builds the internal listener's router: no auth, no rate limiting, no
/// idempotency — this surface is only reachable on the internal bind
/// address.
#[must_use]
pub fn internal_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics::render))
        .route("/health", get(health::liveness))
        .route("/ready", get(health::readiness))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_header_name_is_valid() {
        let _: axum::http::HeaderName = REQUEST_ID_HEADER.parse().unwrap();
    }
}
