//! `/health` (liveness) and `/ready` (readiness) handlers on the internal
//! listener.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coresvc_core::ports::tx_manager::TxManagerExt;
use serde::Serialize;

use crate::state::AppState;

/// Always 200 while the process is responsive — no dependency checks.
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    ok: bool,
}

#[derive(Debug, Serialize)]
struct ReadinessBody {
    checks: Vec<CheckResult>,
}

/// Runs every registered readiness check with a per-check timeout, 200 only
/// if all succeed.
pub async fn readiness(State(state): State<AppState>) -> Response {
    let timeout = state.config.readiness_check_timeout;
    let mut checks = Vec::new();

    let db_ok = match tokio::time::timeout(timeout, state.tx.with_tx(|_q| async { Ok(()) })).await {
        Ok(Ok(())) => true,
        Ok(Err(_)) | Err(_) => false,
    };
    checks.push(CheckResult { name: "database", ok: db_ok });

    let idempotency_ok = matches!(
        tokio::time::timeout(timeout, probe_idempotency(&state)).await,
        Ok(true)
    );
    checks.push(CheckResult {
        name: "idempotency_store",
        ok: idempotency_ok,
    });

    let all_ok = checks.iter().all(|c| c.ok);
    let status = if all_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(ReadinessBody { checks })).into_response()
}

async fn probe_idempotency(state: &AppState) -> bool {
    state
        .idempotency
        .try_begin("__readiness_probe__", Duration::from_secs(1))
        .await
        .is_ok()
}
