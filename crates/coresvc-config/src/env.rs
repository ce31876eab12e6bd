//! Environment variable layer: applies `std::env` overrides onto a
//! [`RawConfig`], including the `<NAME>_FILE` secret-file convention.

use std::collections::HashMap;
use std::path::Path;

use crate::schema::RawConfig;

/// Reads a secret either directly from `name` or, if `<name>_FILE` is set,
/// from the trimmed contents of the file it names. The file variant takes
/// precedence so secrets can be mounted rather than passed as plaintext
/// env vars.
fn read_secret(env: &impl EnvSource, name: &str) -> Option<String> {
    let file_var = format!("{name}_FILE");
    if let Some(path) = env.get(&file_var) {
        return std::fs::read_to_string(Path::new(&path))
            .ok()
            .map(|contents| contents.trim().to_string());
    }
    env.get(name)
}

/// Abstraction over the source of environment variables, so tests can
/// supply an in-memory map instead of mutating the real process
/// environment.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

pub(crate) fn apply(raw: &mut RawConfig, env: &impl EnvSource) {
    if let Some(v) = env.get("PORT") {
        raw.port = v.parse().ok();
    }
    if let Some(v) = env.get("INTERNAL_PORT") {
        raw.internal_port = v.parse().ok();
    }
    if let Some(v) = env.get("INTERNAL_BIND_ADDRESS") {
        raw.internal_bind_address = Some(v);
    }
    if let Some(v) = env.get("ENV") {
        raw.env = Some(v);
    }
    if let Some(v) = env.get("JWT_ENABLED") {
        raw.jwt_enabled = v.parse().ok();
    }
    if let Some(v) = read_secret(env, "JWT_SECRET") {
        raw.jwt_secret = Some(v);
    }
    if let Some(v) = env.get("JWT_ISSUER") {
        raw.jwt_issuer = Some(v);
    }
    if let Some(v) = env.get("JWT_AUDIENCE") {
        raw.jwt_audience = Some(v);
    }
    if let Some(v) = env.get("JWT_LEEWAY_SECS") {
        raw.jwt_leeway_secs = v.parse().ok();
    }
    if let Some(v) = env.get("RATE_LIMIT_RPS") {
        raw.rate_limit_rps = v.parse().ok();
    }
    if let Some(v) = env.get("RATE_LIMIT_BURST") {
        raw.rate_limit_burst = v.parse().ok();
    }
    if let Some(v) = env.get("TRUST_PROXY") {
        raw.trust_proxy = v.parse().ok();
    }
    if let Some(v) = env.get("PROBLEM_BASE_URL") {
        raw.problem_base_url = Some(v);
    }
    if let Some(v) = env.get("AUDIT_REDACT_EMAIL") {
        raw.audit_redact_email = Some(v);
    }
    if let Some(v) = env.get("HTTP_READ_HEADER_TIMEOUT") {
        raw.http_read_header_timeout_secs = v.parse().ok();
    }
    if let Some(v) = env.get("HTTP_MAX_HEADER_BYTES") {
        raw.http_max_header_bytes = v.parse().ok();
    }
    if let Some(v) = env.get("MAX_REQUEST_SIZE") {
        raw.max_request_size = v.parse().ok();
    }
    if let Some(v) = read_secret(env, "DATABASE_URL") {
        raw.database_url = Some(v);
    }
    if let Some(v) = env.get("DB_POOL_MIN_CONNS") {
        raw.db_pool_min_conns = v.parse().ok();
    }
    if let Some(v) = env.get("DB_POOL_MAX_CONNS") {
        raw.db_pool_max_conns = v.parse().ok();
    }
    if let Some(v) = env.get("DB_POOL_MAX_LIFETIME_SECS") {
        raw.db_pool_max_lifetime_secs = v.parse().ok();
    }
    if let Some(v) = env.get("LOG_LEVEL") {
        raw.log_level = Some(v.trim().to_lowercase());
    }
    if let Some(v) = env.get("SHUTDOWN_TIMEOUT_SECS") {
        raw.shutdown_timeout_secs = v.parse().ok();
    }
    if let Some(v) = env.get("IDEMPOTENCY_TTL_SECS") {
        raw.idempotency_ttl_secs = v.parse().ok();
    }
    if let Some(v) = env.get("IDEMPOTENCY_FAIL_MODE") {
        raw.idempotency_fail_mode = Some(v);
    }
    if let Some(v) = env.get("READINESS_CHECK_TIMEOUT_SECS") {
        raw.readiness_check_timeout_secs = v.parse().ok();
    }
}
