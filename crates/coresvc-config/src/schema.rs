//! The immutable `Config` struct and its constituent enums.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "development" => Some(Self::Development),
            "staging" => Some(Self::Staging),
            "production" => Some(Self::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditRedactEmail {
    Full,
    Partial,
}

impl AuditRedactEmail {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "full" => Some(Self::Full),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbPoolConfig {
    pub min_conns: u32,
    pub max_conns: u32,
    pub max_lifetime: Duration,
}

/// What the idempotency middleware does when the backing store itself
/// fails (as opposed to the happy path of a reservation hit/miss).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdempotencyFailureMode {
    /// Process the request normally; the at-most-one guarantee is relaxed
    /// for the duration of the outage.
    Open,
    /// Surface the error so the client retries rather than risk a
    /// duplicate side effect.
    Closed,
}

impl IdempotencyFailureMode {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Fully resolved, validated configuration. Every field here has already
/// passed through [`crate::loader::Config::load`]'s validation pass — no
/// downstream code needs to re-check ranges or non-emptiness.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub internal_port: u16,
    pub internal_bind_address: String,
    pub env: Environment,
    pub jwt_enabled: bool,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub jwt_leeway: Duration,
    pub rate_limit_rps: f64,
    pub rate_limit_burst: u32,
    pub trust_proxy: bool,
    pub problem_base_url: String,
    pub audit_redact_email: AuditRedactEmail,
    pub http_read_header_timeout: Duration,
    pub http_max_header_bytes: usize,
    pub max_request_size: usize,
    pub database_url: String,
    pub db_pool: DbPoolConfig,
    pub log_level: LogLevel,
    pub shutdown_timeout: Duration,
    pub idempotency_ttl: Duration,
    pub idempotency_fail_mode: IdempotencyFailureMode,
    pub readiness_check_timeout: Duration,
}

/// Raw, partially-populated configuration as assembled from file + env
/// layers, before defaults are applied and validation runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RawConfig {
    pub port: Option<u16>,
    pub internal_port: Option<u16>,
    pub internal_bind_address: Option<String>,
    pub env: Option<String>,
    pub jwt_enabled: Option<bool>,
    pub jwt_secret: Option<String>,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub jwt_leeway_secs: Option<u64>,
    pub rate_limit_rps: Option<f64>,
    pub rate_limit_burst: Option<u32>,
    pub trust_proxy: Option<bool>,
    pub problem_base_url: Option<String>,
    pub audit_redact_email: Option<String>,
    pub http_read_header_timeout_secs: Option<u64>,
    pub http_max_header_bytes: Option<usize>,
    pub max_request_size: Option<usize>,
    pub database_url: Option<String>,
    pub db_pool_min_conns: Option<u32>,
    pub db_pool_max_conns: Option<u32>,
    pub db_pool_max_lifetime_secs: Option<u64>,
    pub log_level: Option<String>,
    pub shutdown_timeout_secs: Option<u64>,
    pub idempotency_ttl_secs: Option<u64>,
    pub idempotency_fail_mode: Option<String>,
    pub readiness_check_timeout_secs: Option<u64>,
}
