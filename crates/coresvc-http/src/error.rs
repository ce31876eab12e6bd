//! RFC 7807 emission: maps [`AppError`] (by way of its stable
//! UPPER_SNAKE `code()`) through a status/title registry and writes
//! `application/problem+json`.
//!
//! Unrecognized errors never leak internals — they fall through to
//! `INTERNAL_ERROR` / 500 with a safe, fixed detail message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use coresvc_core::AppError;
use coresvc_resilience::ResilienceError;

use crate::dto::problem::{Problem, ValidationErrorItem};

/// Every code this service emits at the transport boundary, and the
/// status/title pair the registry maps it to. Declaring them together
/// enforces "every code used at the boundary is declared" (design notes).
fn registry(code: &str) -> (StatusCode, &'static str) {
    match code {
        "VALIDATION_ERROR" => (StatusCode::BAD_REQUEST, "Validation Failed"),
        "BAD_REQUEST" => (StatusCode::BAD_REQUEST, "Bad Request"),
        "UNAUTHORIZED" => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        "FORBIDDEN" => (StatusCode::FORBIDDEN, "Forbidden"),
        "CONFLICT" => (StatusCode::CONFLICT, "Conflict"),
        "EMAIL_EXISTS" => (StatusCode::CONFLICT, "Conflict"),
        "REQUEST_TOO_LARGE" => (StatusCode::PAYLOAD_TOO_LARGE, "Request Too Large"),
        "RATE_LIMIT_EXCEEDED" => (StatusCode::TOO_MANY_REQUESTS, "Rate Limit Exceeded"),
        "TIMEOUT" => (StatusCode::GATEWAY_TIMEOUT, "Timeout"),
        "RES-001" | "RES-002" | "RES-004" => {
            (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
        }
        "RES-003" => (StatusCode::GATEWAY_TIMEOUT, "Timeout"),
        code if code.ends_with("NOT_FOUND") => (StatusCode::NOT_FOUND, "Not Found"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
    }
}

fn type_slug(code: &str) -> String {
    code.to_lowercase().replace('_', "-").replace(' ', "-")
}

/// The stable code this error surfaces to clients. [`AppError::NotFound`]
/// is given an entity-specific subtype (`USER_NOT_FOUND`) for the response
/// body, while the core sentinel (`AppError::code()`) stays the generic
/// `NOT_FOUND` used for internal chain-aware comparisons.
fn response_code(err: &AppError) -> String {
    match err {
        AppError::NotFound { entity } => format!("{}_NOT_FOUND", entity.to_uppercase()),
        other => other.code().to_string(),
    }
}

/// Safe-to-display detail message. Only a fixed, generic string is ever
/// returned for `Internal` — the cause is logged server-side, never
/// serialized.
fn safe_detail(err: &AppError) -> Option<String> {
    match err {
        AppError::Internal { .. } => None,
        AppError::Validation { violations } => Some(format!(
            "{} field(s) failed validation: {}",
            violations.len(),
            violations
                .iter()
                .map(|v| v.field.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )),
        other => Some(other.to_string()),
    }
}

fn validation_errors(err: &AppError) -> Option<Vec<ValidationErrorItem>> {
    match err {
        AppError::Validation { violations } => Some(
            violations
                .iter()
                .map(|v| ValidationErrorItem {
                    field: v.field.to_string(),
                    message: v.message.clone(),
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Build the `application/problem+json` body and status for `err`,
/// stamping `request_id` so operators can correlate with logs.
#[must_use]
pub fn problem_for(err: &AppError, request_id: &str, problem_base_url: &str) -> (StatusCode, Problem) {
    let code = response_code(err);
    let (status, title) = registry(&code);

    if matches!(err, AppError::Internal { .. }) {
        tracing::error!(
            request_id = %request_id,
            code = %code,
            cause = %err,
            "internal error"
        );
    }

    let problem = Problem {
        r#type: format!("{problem_base_url}{}", type_slug(&code)),
        title: title.to_string(),
        status: status.as_u16(),
        detail: safe_detail(err),
        code,
        request_id: request_id.to_string(),
        validation_errors: validation_errors(err),
    };

    (status, problem)
}

/// Builds a fixed-status problem response directly, for the handful of
/// rejections (shutdown guard, rate limiter) that happen before an
/// `AppError` would normally be constructed and whose status the registry
/// doesn't need to derive.
#[must_use]
pub fn fixed_problem(
    status: StatusCode,
    code: &str,
    detail: &str,
    request_id: &str,
    problem_base_url: &str,
) -> Response {
    let problem = Problem {
        r#type: format!("{problem_base_url}{}", type_slug(code)),
        title: status.canonical_reason().unwrap_or("Error").to_string(),
        status: status.as_u16(),
        detail: Some(detail.to_string()),
        code: code.to_string(),
        request_id: request_id.to_string(),
        validation_errors: None,
    };
    let mut response = (status, Json(problem)).into_response();
    response
        .headers_mut()
        .insert(axum::http::header::CONTENT_TYPE, "application/problem+json".parse().unwrap());
    response
}

/// Wraps an [`AppError`] with the request-scoped context (`requestId`,
/// configured problem base URL) needed to render it.
pub struct ProblemResponse {
    pub error: AppError,
    pub request_id: String,
    pub problem_base_url: String,
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let (status, problem) = problem_for(&self.error, &self.request_id, &self.problem_base_url);
        let mut response = (status, Json(problem)).into_response();
        response
            .headers_mut()
            .insert(axum::http::header::CONTENT_TYPE, "application/problem+json".parse().unwrap());
        response
    }
}

/// Maps a resilience-primitive failure into the stable `AppError` taxonomy
/// so it flows through the same RFC 7807 path as any other use-case error.
/// `CircuitOpen`/`BulkheadFull` keep their `RES-00x` code via
/// `AppError::Unavailable` so the registry's 503 arm (not `INTERNAL_ERROR`)
/// actually gets hit, per spec §7 ("Resilience … surfaced as 503 by outer
/// translation").
pub fn from_resilience<E>(err: ResilienceError<E>) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let code = err.code();
    match err {
        ResilienceError::CircuitOpen | ResilienceError::BulkheadFull => {
            AppError::Unavailable { code }
        }
        ResilienceError::TimeoutExceeded(_) => AppError::Timeout,
        ResilienceError::RetriesExhausted { source, .. } => AppError::internal(source),
        ResilienceError::Operation(source) => AppError::internal(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_gets_entity_subtype_code() {
        let err = AppError::NotFound { entity: "user" };
        let (status, problem) = problem_for(&err, "req-1", "https://api.example.com/problems/");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(problem.code, "USER_NOT_FOUND");
        assert!(problem.r#type.ends_with("/user-not-found"));
    }

    #[test]
    fn internal_error_never_leaks_detail() {
        let err = AppError::internal(std::io::Error::other("disk on fire"));
        let (status, problem) = problem_for(&err, "req-1", "https://api.example.com/problems/");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(problem.detail.is_none());
        assert_eq!(problem.code, "INTERNAL_ERROR");
    }

    #[test]
    fn validation_error_lists_every_field() {
        let err = AppError::Validation {
            violations: vec![
                coresvc_core::domain::error::FieldViolation::new("email", "must not be empty"),
            ],
        };
        let (status, problem) = problem_for(&err, "req-1", "https://api.example.com/problems/");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(problem.validation_errors.unwrap().len(), 1);
    }

    #[test]
    fn circuit_open_surfaces_as_503_not_internal_error() {
        let err = from_resilience(ResilienceError::<std::io::Error>::CircuitOpen);
        assert_eq!(err.code(), "RES-001");
        let (status, problem) = problem_for(&err, "req-1", "https://api.example.com/problems/");
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(problem.code, "RES-001");
    }

    #[test]
    fn bulkhead_full_surfaces_as_503() {
        let err = from_resilience(ResilienceError::<std::io::Error>::BulkheadFull);
        let (status, _problem) = problem_for(&err, "req-1", "https://api.example.com/problems/");
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn resilience_timeout_surfaces_as_504() {
        let err = from_resilience(ResilienceError::<std::io::Error>::TimeoutExceeded(
            std::time::Duration::from_secs(1),
        ));
        let (status, _problem) = problem_for(&err, "req-1", "https://api.example.com/problems/");
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }
}
