//! `StrictJson<T>`: fuses strict decode (unknown fields rejected, syntax
//! and type errors named by field path) with structural validation
//! (`ValidateRequestBody`) in a single extractor, exactly as the contract
//! requires — unknown-field rejection runs before validation runs.

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use coresvc_core::domain::error::FieldViolation;
use coresvc_core::AppError;

use crate::error::ProblemResponse;
use crate::state::AppState;

/// Implemented by every request DTO that carries structural (not just
/// shape) validation — field emptiness, length bounds, format checks.
/// Decoding alone only proves the JSON matches the DTO's shape.
pub trait ValidateRequestBody {
    fn validate_body(&self) -> Vec<FieldViolation>;
}

pub struct StrictJson<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for StrictJson<T>
where
    T: DeserializeOwned + ValidateRequestBody,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let problem_base_url = state.config.problem_base_url.clone();
        let request_id = req
            .extensions()
            .get::<crate::middleware::request_id::RequestId>()
            .map_or_else(String::new, |id| id.0.clone());

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| reject(&request_id, &problem_base_url, "request body could not be read"))?;

        let deserializer = &mut serde_json::Deserializer::from_slice(&bytes);
        let value: T = serde_path_to_error::deserialize(deserializer).map_err(|err| {
            let path = err.path().to_string();
            reject(&request_id, &problem_base_url, &format!("{path}: {}", err.inner()))
        })?;

        let violations = value.validate_body();
        if !violations.is_empty() {
            return Err(ProblemResponse {
                error: AppError::Validation { violations },
                request_id,
                problem_base_url,
            }
            .into_response());
        }

        Ok(Self(value))
    }
}

fn reject(request_id: &str, problem_base_url: &str, detail: &str) -> Response {
    crate::error::fixed_problem(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", detail, request_id, problem_base_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Sample {
        name: String,
    }

    impl ValidateRequestBody for Sample {
        fn validate_body(&self) -> Vec<FieldViolation> {
            if self.name.is_empty() {
                vec![FieldViolation::new("name", "must not be empty")]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn unknown_field_is_named_in_path_error() {
        let deserializer = &mut serde_json::Deserializer::from_str(r#"{"name":"a","extra":1}"#);
        let err = serde_path_to_error::deserialize::<_, Sample>(deserializer).unwrap_err();
        assert!(err.to_string().contains("extra") || err.inner().to_string().contains("unknown field"));
    }
}
