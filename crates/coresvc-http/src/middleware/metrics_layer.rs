//! Layer 3: observes request count, latency, and response size keyed by
//! method + routed path template + status, feeding [`crate::metrics::Metrics`].

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::state::AppState;

/// `MatchedPath` is taken as an extractor argument, not read off
/// `request.extensions()` after the fact: axum resolves the full route match
/// before running a `from_fn` middleware's own extractors, so this is the
/// route template (e.g. `/users/{id}`) even though the middleware is layered
/// outside the nested router. `None` for unmatched requests (404s).
pub async fn observe(matched_path: Option<MatchedPath>, State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_string();
    let route = matched_path.map_or_else(|| request.uri().path().to_string(), |p| p.as_str().to_string());

    let started = Instant::now();
    let response = next.run(request).await;
    let duration = started.elapsed();

    let response_bytes = response
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    state
        .metrics
        .observe_request(&method, &route, response.status().as_u16(), duration, response_bytes);

    response
}
