//! `GET /metrics` on the internal listener: hand-rolled Prometheus text
//! exposition. Never mounted on the public router — see `routes.rs`.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

use crate::state::AppState;

pub async fn render(State(state): State<AppState>) -> impl IntoResponse {
    let pool = state.pool_metrics.as_ref().map(|f| f());
    let body = state.metrics.render(
        pool,
        state.shutdown.is_shutting_down(),
        state.shutdown.in_flight(),
    );
    ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
