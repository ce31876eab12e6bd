//! Layer 10: HS256 bearer token validation. Requires `exp`; validates
//! `iss`/`aud` when configured; applies the configured leeway; rejects an
//! empty `sub`; normalizes role (lowercase, trimmed). On success, attaches
//! an [`AuthContext`] and marks the request "claims validated" for
//! [`crate::middleware::auth_context_bridge`] to check.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use coresvc_core::{AuthContext, Id, Role};

use crate::error::fixed_problem;
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

/// Marker inserted once claims have passed full validation. Checked by
/// [`crate::middleware::auth_context_bridge::require`] as a defense against
/// a route being wired up without this layer in front of it.
#[derive(Debug, Clone, Copy)]
pub struct ClaimsValidated;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    #[allow(dead_code)]
    exp: u64,
}

fn unauthorized(request_id: &str, problem_base_url: &str) -> Response {
    let mut response = fixed_problem(
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
        "authentication required",
        request_id,
        problem_base_url,
    );
    response
        .headers_mut()
        .insert(axum::http::header::WWW_AUTHENTICATE, "Bearer".parse().unwrap());
    response
}

/// Validates the bearer token and attaches [`AuthContext`] + marker on
/// success. Every failure path returns the same opaque 401 — the response
/// body must carry no indication of which claim failed.
pub async fn authenticate(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map_or_else(String::new, |id| id.0.clone());

    if !state.config.jwt_enabled {
        request.extensions_mut().insert(AuthContext::new(Id::generate(), Role::Admin));
        request.extensions_mut().insert(ClaimsValidated);
        return next.run(request).await;
    }

    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return unauthorized(&request_id, &state.config.problem_base_url);
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = state.config.jwt_leeway.as_secs();
    validation.validate_exp = true;
    if let Some(iss) = &state.config.jwt_issuer {
        validation.set_issuer(&[iss]);
    }
    if let Some(aud) = &state.config.jwt_audience {
        validation.set_audience(&[aud]);
    }

    let key = DecodingKey::from_secret(state.config.jwt_secret.as_bytes());
    let Ok(token) = decode::<Claims>(bearer.token(), &key, &validation) else {
        return unauthorized(&request_id, &state.config.problem_base_url);
    };

    let claims = token.claims;
    let subject = claims.sub.trim();
    if subject.is_empty() {
        return unauthorized(&request_id, &state.config.problem_base_url);
    }

    let Ok(subject_id) = subject.parse::<Id>() else {
        return unauthorized(&request_id, &state.config.problem_base_url);
    };

    let normalized_role = claims.role.trim().to_lowercase();
    let Some(role) = Role::parse(&normalized_role) else {
        return unauthorized(&request_id, &state.config.problem_base_url);
    };

    request.extensions_mut().insert(AuthContext::new(subject_id, role));
    request.extensions_mut().insert(ClaimsValidated);
    next.run(request).await
}
