//! Layer 4: one structured log record per request, with the fields
//! `Tracing`'s span already correlates (trace/span IDs land in every event
//! emitted inside that span automatically).

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::middleware::request_id::RequestId;
use crate::state::AppState;

pub async fn log(State(_state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map_or_else(String::new, |id| id.0.clone());

    let started = Instant::now();
    let response = next.run(request).await;
    let duration = started.elapsed();

    tracing::info!(
        method = %method,
        route = %path,
        status = response.status().as_u16(),
        duration_ms = duration.as_millis(),
        request_id = %request_id,
        "request handled"
    );

    response
}
