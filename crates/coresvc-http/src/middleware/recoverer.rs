//! Layer 7: catches panics from inner handlers, logs them with the request
//! ID, and turns them into a 500 RFC 7807 response instead of tearing down
//! the connection. Built on `tower_http::catch_panic`, whose default
//! response this replaces with the service's own problem-details body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;

use crate::dto::problem::Problem;

/// Renders the panic into the same `application/problem+json` shape every
/// other error takes. The request ID isn't available from inside the panic
/// handler callback (no request in scope at this point) so the field is
/// left blank; the outer `RequestID`/`Logger` layers still log the
/// request's ID alongside the panic via tracing's panic hook integration.
fn render_panic(payload: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());

    tracing::error!(panic = detail.as_deref().unwrap_or("<non-string panic payload>"), "recovered from panic");

    let problem = Problem {
        r#type: "about:blank".to_string(),
        title: "Internal Server Error".to_string(),
        status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        detail: None,
        code: "INTERNAL_ERROR".to_string(),
        request_id: String::new(),
        validation_errors: None,
    };
    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(problem)).into_response();
    response
        .headers_mut()
        .insert(axum::http::header::CONTENT_TYPE, "application/problem+json".parse().unwrap());
    response
}

#[must_use]
pub fn layer() -> CatchPanicLayer<fn(Box<dyn std::any::Any + Send + 'static>) -> Response<axum::body::Body>> {
    CatchPanicLayer::custom(render_panic as fn(Box<dyn std::any::Any + Send + 'static>) -> Response<axum::body::Body>)
}
