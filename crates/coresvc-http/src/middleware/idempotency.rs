//! Layer 12: at-most-one-effect POST semantics keyed by `Idempotency-Key`,
//! per the algorithm: atomic `setNX` reservation, buffered completion,
//! replay on repeat.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use coresvc_core::AppError;
use coresvc_config::IdempotencyFailureMode;
use coresvc_core::ports::idempotency_store::{FailureMode, IdempotencyOutcome, IdempotencyRecord};

use crate::error::{fixed_problem, ProblemResponse};
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
const IDEMPOTENCY_STATUS_HEADER: &str = "idempotency-status";
const MAX_BUFFERED_BODY: usize = 10 * 1024 * 1024;

/// Active only for POST requests carrying `Idempotency-Key`; every other
/// method/request passes straight through.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.method() != axum::http::Method::POST {
        return next.run(request).await;
    }

    let Some(key) = request
        .headers()
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
    else {
        return next.run(request).await;
    };

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map_or_else(String::new, |id| id.0.clone());

    let ttl = state.config.idempotency_ttl;
    match state.idempotency.try_begin(&key, ttl).await {
        Ok(IdempotencyOutcome::Begun) => {
            let response = next.run(request).await;
            let (mut parts, body) = response.into_parts();
            let bytes = match to_bytes(body, MAX_BUFFERED_BODY).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    return fixed_problem(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "failed to buffer response for idempotency recording",
                        &request_id,
                        &state.config.problem_base_url,
                    );
                }
            };

            let record = IdempotencyRecord {
                status_code: parts.status.as_u16(),
                headers: header_map_to_plain(&parts.headers),
                body: bytes.to_vec(),
                stored_at: chrono::Utc::now(),
                ttl,
            };

            if let Err(err) = state.idempotency.complete(&key, record).await {
                match idempotency_failure_mode(&state) {
                    IdempotencyFailureMode::Open => {}
                    IdempotencyFailureMode::Closed => {
                        return ProblemResponse {
                            error: AppError::internal(err),
                            request_id,
                            problem_base_url: state.config.problem_base_url.clone(),
                        }
                        .into_response();
                    }
                }
            }

            state.metrics.record_idempotency_stored();
            parts.headers.insert(IDEMPOTENCY_STATUS_HEADER, "stored".parse().unwrap());
            Response::from_parts(parts, Body::from(bytes))
        }
        Ok(IdempotencyOutcome::Completed(record)) => {
            state.metrics.record_idempotency_replayed();
            replay(record)
        }
        Ok(IdempotencyOutcome::InFlight) => fixed_problem(
            StatusCode::CONFLICT,
            "CONFLICT",
            "a request with this idempotency key is still in flight",
            &request_id,
            &state.config.problem_base_url,
        ),
        Err(err) => match idempotency_failure_mode(&state) {
            IdempotencyFailureMode::Open => next.run(request).await,
            IdempotencyFailureMode::Closed => ProblemResponse {
                error: AppError::internal(err),
                request_id,
                problem_base_url: state.config.problem_base_url.clone(),
            }
            .into_response(),
        },
    }
}

fn idempotency_failure_mode(state: &AppState) -> IdempotencyFailureMode {
    match state.idempotency.failure_mode() {
        FailureMode::FailOpen => IdempotencyFailureMode::Open,
        FailureMode::FailClosed => IdempotencyFailureMode::Closed,
    }
}

fn replay(record: IdempotencyRecord) -> Response {
    let mut builder = Response::builder().status(
        StatusCode::from_u16(record.status_code).unwrap_or(StatusCode::OK),
    );
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in &record.headers {
            if let (Ok(name), Ok(value)) = (
                axum::http::HeaderName::try_from(name.as_str()),
                axum::http::HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, value);
            }
        }
        headers.insert(IDEMPOTENCY_STATUS_HEADER, "replayed".parse().unwrap());
    }
    builder
        .body(Body::from(record.body))
        .unwrap_or_else(|_| fixed_problem(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "failed to replay idempotent response", "", ""))
}

fn header_map_to_plain(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
