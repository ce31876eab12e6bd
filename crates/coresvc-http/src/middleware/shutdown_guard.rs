//! Layer 8 of the pipeline: once the shutdown flag is set, new requests are
//! rejected with 503 rather than started. Paired with an in-flight counter
//! the bootstrap's shutdown coordinator polls while draining.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::fixed_problem;
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

/// Shared between the HTTP layer and the bootstrap's shutdown coordinator.
/// The coordinator flips `shutting_down` on signal receipt and polls
/// `in_flight` while draining.
#[derive(Debug, Default)]
pub struct ShutdownState {
    shutting_down: AtomicBool,
    in_flight: AtomicI64,
}

impl ShutdownState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn in_flight(&self) -> i64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn enter(&self) -> i64 {
        self.in_flight.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Rejects with 503 once [`ShutdownState::begin_shutdown`] has been called;
/// otherwise counts the request as in-flight for the duration of the call
/// so the drain loop knows when it's safe to stop waiting.
pub async fn guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.shutdown.is_shutting_down() {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map_or_else(String::new, |id| id.0.clone());
        return fixed_problem(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "the server is shutting down",
            &request_id,
            &state.config.problem_base_url,
        );
    }

    state.shutdown.enter();
    let response = next.run(request).await;
    state.shutdown.leave();
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_accepting_requests() {
        let state = ShutdownState::new();
        assert!(!state.is_shutting_down());
        assert_eq!(state.in_flight(), 0);
    }

    #[test]
    fn tracks_in_flight_count() {
        let state = ShutdownState::new();
        assert_eq!(state.enter(), 1);
        assert_eq!(state.enter(), 2);
        state.leave();
        assert_eq!(state.in_flight(), 1);
    }

    #[test]
    fn begin_shutdown_flips_flag() {
        let state = ShutdownState::new();
        state.begin_shutdown();
        assert!(state.is_shutting_down());
    }
}
