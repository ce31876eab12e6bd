//! Layer 6: rejects oversized bodies two ways — a fast path on a declared
//! `Content-Length` over the limit, and a hard byte cap on the body stream
//! itself so a streamed/chunked body without a declared length can't evade
//! the check either.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::fixed_problem;
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

/// Fast-path rejection on declared `Content-Length`. The hard byte cap on
/// the body itself is applied separately via
/// `tower_http::limit::RequestBodyLimitLayer` in `routes.rs`, since that
/// layer already handles the streamed case; this middleware only short
/// circuits the common case without buffering anything.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limit = state.config.max_request_size;
    let declared = request
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(declared) = declared {
        if declared > limit {
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .map_or_else(String::new, |id| id.0.clone());
            return fixed_problem(
                StatusCode::PAYLOAD_TOO_LARGE,
                "REQUEST_TOO_LARGE",
                "request body exceeds the configured size limit",
                &request_id,
                &state.config.problem_base_url,
            );
        }
    }

    next.run(request).await
}
