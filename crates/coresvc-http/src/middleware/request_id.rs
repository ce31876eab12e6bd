//! Layer 1: every request gets a request ID, either the client-supplied
//! `X-Request-ID` (if it parses as a UUID) or a freshly generated one. The
//! ID is stamped into request extensions for downstream layers and echoed
//! on the response.

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request-scoped wrapper, stashed in extensions by [`propagate`] so other
/// middleware can read it without re-parsing the header.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Clone, Default)]
pub struct MakeUuidRequestId;

impl MakeRequestId for MakeUuidRequestId {
    fn make_request_id<B>(&mut self, request: &Request<B>) -> Option<TowerRequestId> {
        let candidate = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| Uuid::parse_str(v).is_ok())
            .map(ToString::to_string);

        let id = candidate.unwrap_or_else(|| Uuid::now_v7().to_string());
        let value = HeaderValue::from_str(&id).ok()?;
        Some(TowerRequestId::new(value))
    }
}

/// Copies the `tower_http`-assigned request ID header value into a
/// [`RequestId`] extension, giving the rest of the pipeline a typed,
/// pre-validated accessor instead of re-reading and re-parsing the header.
pub async fn propagate<B>(mut request: Request<B>) -> Request<B> {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .unwrap_or_default();
    request.extensions_mut().insert(RequestId(id));
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn generates_uuid_when_header_absent() {
        let request = Request::builder().body(Body::empty()).unwrap();
        let mut maker = MakeUuidRequestId;
        let id = maker.make_request_id(&request).unwrap();
        assert!(Uuid::parse_str(id.header_value().to_str().unwrap()).is_ok());
    }

    #[test]
    fn preserves_valid_client_uuid() {
        let client_id = Uuid::now_v7().to_string();
        let request = Request::builder()
            .header(REQUEST_ID_HEADER, client_id.clone())
            .body(Body::empty())
            .unwrap();
        let mut maker = MakeUuidRequestId;
        let id = maker.make_request_id(&request).unwrap();
        assert_eq!(id.header_value().to_str().unwrap(), client_id);
    }

    #[test]
    fn replaces_invalid_client_value() {
        let request = Request::builder()
            .header(REQUEST_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let mut maker = MakeUuidRequestId;
        let id = maker.make_request_id(&request).unwrap();
        assert_ne!(id.header_value().to_str().unwrap(), "not-a-uuid");
    }
}
