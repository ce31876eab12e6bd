//! Application layer: orchestration, authorization, and the transport-facing
//! error taxonomy. Forbids importing transport, infrastructure, or logging
//! frameworks beyond `tracing` facade calls.

pub mod auth;
pub mod error;
