//! Layer 11: defense against route misconfiguration. Refuses to proceed if
//! [`crate::middleware::jwt_auth::ClaimsValidated`] was never set — i.e. if
//! a route under `/api/v1` were ever wired up without the `JWTAuth` layer
//! in front of it, this fails closed instead of silently passing an
//! unauthenticated request through.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::fixed_problem;
use crate::middleware::jwt_auth::ClaimsValidated;
use crate::middleware::request_id::RequestId;

pub async fn require(request: Request, next: Next) -> Response {
    if request.extensions().get::<ClaimsValidated>().is_none() {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map_or_else(String::new, |id| id.0.clone());
        tracing::error!(request_id = %request_id, "route reached without validated claims");
        return fixed_problem(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "authentication required",
            &request_id,
            "about:blank#",
        );
    }

    next.run(request).await
}
