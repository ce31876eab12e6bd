//! Layered configuration loader.
//!
//! Resolution order: optional file (`APP_CONFIG_FILE`, YAML or JSON chosen
//! by extension) → environment variable overrides → `<NAME>_FILE`
//! secret-file variants (handled inside [`crate::env::apply`]) → built-in
//! defaults.

use std::path::Path;
use std::time::Duration;

use crate::env::{self, EnvSource, ProcessEnv};
use crate::error::{ConfigError, FieldError};
use crate::schema::{
    AuditRedactEmail, Config, DbPoolConfig, Environment, IdempotencyFailureMode, LogLevel,
    RawConfig,
};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_INTERNAL_PORT: u16 = 9090;
const DEFAULT_INTERNAL_BIND_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PROBLEM_BASE_URL: &str = "https://api.example.com/problems/";
const DEFAULT_RATE_LIMIT_RPS: f64 = 100.0;
const DEFAULT_HTTP_READ_HEADER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HTTP_MAX_HEADER_BYTES: usize = 1 << 20;
const DEFAULT_MAX_REQUEST_SIZE: usize = 10 << 20;
const DEFAULT_DB_POOL_MIN_CONNS: u32 = 1;
const DEFAULT_DB_POOL_MAX_CONNS: u32 = 10;
const DEFAULT_DB_POOL_MAX_LIFETIME_SECS: u64 = 1800;
const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
const DEFAULT_IDEMPOTENCY_TTL_SECS: u64 = 86_400;
const DEFAULT_READINESS_CHECK_TIMEOUT_SECS: u64 = 2;

impl Config {
    /// Load configuration from the environment (and optional
    /// `APP_CONFIG_FILE`), applying defaults and aggregated validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&ProcessEnv)
    }

    /// Same resolution order as [`Config::load`], but reading variables
    /// from `env` instead of the process environment — used by tests.
    pub fn load_from(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let mut raw = RawConfig::default();

        if let Some(path) = env.get("APP_CONFIG_FILE") {
            merge_file(&mut raw, Path::new(&path))?;
        }

        env::apply(&mut raw, env);

        build(raw)
    }
}

fn merge_file(raw: &mut RawConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileUnreadable {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let from_file: RawConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents).map_err(|e| ConfigError::FileMalformed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?,
        _ => serde_yaml::from_str(&contents).map_err(|e| ConfigError::FileMalformed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?,
    };

    *raw = merge_raw(raw.clone(), from_file);
    Ok(())
}

/// File values supply defaults; fields already set (by an earlier,
/// higher-precedence layer) are left alone. Since the file is merged
/// before env overrides are applied, at this point `into` is empty and
/// `file` always wins for any field the file sets.
fn merge_raw(into: RawConfig, file: RawConfig) -> RawConfig {
    RawConfig {
        port: into.port.or(file.port),
        internal_port: into.internal_port.or(file.internal_port),
        internal_bind_address: into.internal_bind_address.or(file.internal_bind_address),
        env: into.env.or(file.env),
        jwt_enabled: into.jwt_enabled.or(file.jwt_enabled),
        jwt_secret: into.jwt_secret.or(file.jwt_secret),
        jwt_issuer: into.jwt_issuer.or(file.jwt_issuer),
        jwt_audience: into.jwt_audience.or(file.jwt_audience),
        jwt_leeway_secs: into.jwt_leeway_secs.or(file.jwt_leeway_secs),
        rate_limit_rps: into.rate_limit_rps.or(file.rate_limit_rps),
        rate_limit_burst: into.rate_limit_burst.or(file.rate_limit_burst),
        trust_proxy: into.trust_proxy.or(file.trust_proxy),
        problem_base_url: into.problem_base_url.or(file.problem_base_url),
        audit_redact_email: into.audit_redact_email.or(file.audit_redact_email),
        http_read_header_timeout_secs: into
            .http_read_header_timeout_secs
            .or(file.http_read_header_timeout_secs),
        http_max_header_bytes: into.http_max_header_bytes.or(file.http_max_header_bytes),
        max_request_size: into.max_request_size.or(file.max_request_size),
        database_url: into.database_url.or(file.database_url),
        db_pool_min_conns: into.db_pool_min_conns.or(file.db_pool_min_conns),
        db_pool_max_conns: into.db_pool_max_conns.or(file.db_pool_max_conns),
        db_pool_max_lifetime_secs: into
            .db_pool_max_lifetime_secs
            .or(file.db_pool_max_lifetime_secs),
        log_level: into.log_level.or(file.log_level),
        shutdown_timeout_secs: into.shutdown_timeout_secs.or(file.shutdown_timeout_secs),
        idempotency_ttl_secs: into.idempotency_ttl_secs.or(file.idempotency_ttl_secs),
        idempotency_fail_mode: into.idempotency_fail_mode.or(file.idempotency_fail_mode),
        readiness_check_timeout_secs: into
            .readiness_check_timeout_secs
            .or(file.readiness_check_timeout_secs),
    }
}

fn build(raw: RawConfig) -> Result<Config, ConfigError> {
    let mut violations = Vec::new();

    let env = match raw.env.as_deref() {
        None => Environment::Development,
        Some(raw_value) => match Environment::parse(raw_value) {
            Some(parsed) => parsed,
            None => {
                violations.push(FieldError::new("env", "must be development, staging, or production"));
                Environment::Development
            }
        },
    };

    let port = raw.port.unwrap_or(DEFAULT_PORT);
    let internal_port = raw.internal_port.unwrap_or(DEFAULT_INTERNAL_PORT);
    if port == internal_port && port != 0 {
        violations.push(FieldError::new("port", "must differ from internalPort"));
    }

    let internal_bind_address = raw
        .internal_bind_address
        .unwrap_or_else(|| DEFAULT_INTERNAL_BIND_ADDRESS.to_string());
    if internal_bind_address.trim().is_empty() {
        violations.push(FieldError::new("internalBindAddress", "must not be empty"));
    }

    let jwt_enabled = raw.jwt_enabled.unwrap_or(true);
    let jwt_secret = raw.jwt_secret.unwrap_or_default();
    let trimmed_secret_len = jwt_secret.trim().len();

    if matches!(env, Environment::Production) {
        if !jwt_enabled {
            violations.push(FieldError::new(
                "jwtEnabled",
                "ENV=production requires JWT_ENABLED=true",
            ));
        }
        if trimmed_secret_len == 0 {
            violations.push(FieldError::new("jwtSecret", "must not be empty in production"));
        }
    }
    if jwt_enabled && trimmed_secret_len > 0 && trimmed_secret_len < 32 {
        violations.push(FieldError::new(
            "jwtSecret",
            "must be at least 32 bytes after trimming",
        ));
    }
    if jwt_enabled && trimmed_secret_len == 0 && !matches!(env, Environment::Production) {
        violations.push(FieldError::new(
            "jwtSecret",
            "must be set when jwtEnabled is true",
        ));
    }

    let jwt_issuer = raw.jwt_issuer.filter(|v| !v.trim().is_empty());
    let jwt_audience = raw.jwt_audience.filter(|v| !v.trim().is_empty());
    let jwt_leeway = Duration::from_secs(raw.jwt_leeway_secs.unwrap_or(DEFAULT_JWT_LEEWAY_SECS));

    let rate_limit_rps = raw.rate_limit_rps.unwrap_or(DEFAULT_RATE_LIMIT_RPS);
    if rate_limit_rps <= 0.0 {
        violations.push(FieldError::new("rateLimitRps", "must be strictly greater than 0"));
    }
    let rate_limit_burst = raw
        .rate_limit_burst
        .unwrap_or_else(|| rate_limit_rps.ceil().max(1.0) as u32);
    if rate_limit_burst == 0 {
        violations.push(FieldError::new("rateLimitBurst", "must be strictly greater than 0"));
    }

    let trust_proxy = raw.trust_proxy.unwrap_or(false);

    let problem_base_url = raw
        .problem_base_url
        .unwrap_or_else(|| DEFAULT_PROBLEM_BASE_URL.to_string());
    if !is_absolute_url_with_trailing_slash(&problem_base_url) {
        violations.push(FieldError::new(
            "problemBaseUrl",
            "must be an absolute URL ending with '/'",
        ));
    }

    let audit_redact_email = match raw.audit_redact_email.as_deref() {
        None => AuditRedactEmail::Partial,
        Some(raw_value) => match AuditRedactEmail::parse(raw_value) {
            Some(parsed) => parsed,
            None => {
                violations.push(FieldError::new("auditRedactEmail", "must be full or partial"));
                AuditRedactEmail::Partial
            }
        },
    };

    let http_read_header_timeout = Duration::from_secs(
        raw.http_read_header_timeout_secs
            .unwrap_or(DEFAULT_HTTP_READ_HEADER_TIMEOUT_SECS),
    );
    let http_max_header_bytes = raw
        .http_max_header_bytes
        .unwrap_or(DEFAULT_HTTP_MAX_HEADER_BYTES);
    let max_request_size = raw.max_request_size.unwrap_or(DEFAULT_MAX_REQUEST_SIZE);

    let database_url = raw.database_url.unwrap_or_default();
    if database_url.trim().is_empty() {
        violations.push(FieldError::new("databaseUrl", "must not be empty"));
    }

    let db_pool_min_conns = raw.db_pool_min_conns.unwrap_or(DEFAULT_DB_POOL_MIN_CONNS);
    let db_pool_max_conns = raw.db_pool_max_conns.unwrap_or(DEFAULT_DB_POOL_MAX_CONNS);
    if db_pool_min_conns > db_pool_max_conns {
        violations.push(FieldError::new(
            "dbPoolMinConns",
            "must be less than or equal to dbPoolMaxConns",
        ));
    }
    let db_pool_max_lifetime_secs = raw
        .db_pool_max_lifetime_secs
        .unwrap_or(DEFAULT_DB_POOL_MAX_LIFETIME_SECS);
    if db_pool_max_lifetime_secs == 0 {
        violations.push(FieldError::new("dbPoolMaxLifetimeSecs", "must be greater than 0"));
    }

    let log_level = match raw.log_level.as_deref() {
        None => LogLevel::Info,
        Some(raw_value) => match LogLevel::parse(raw_value) {
            Some(parsed) => parsed,
            None => {
                violations.push(FieldError::new("logLevel", "must be debug, info, warn, or error"));
                LogLevel::Info
            }
        },
    };

    let shutdown_timeout_secs = raw
        .shutdown_timeout_secs
        .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS);
    if shutdown_timeout_secs == 0 {
        violations.push(FieldError::new("shutdownTimeoutSecs", "must be greater than 0"));
    }

    let idempotency_ttl_secs = raw
        .idempotency_ttl_secs
        .unwrap_or(DEFAULT_IDEMPOTENCY_TTL_SECS);
    if idempotency_ttl_secs == 0 {
        violations.push(FieldError::new("idempotencyTtlSecs", "must be greater than 0"));
    }

    let idempotency_fail_mode = match raw.idempotency_fail_mode.as_deref() {
        None => IdempotencyFailureMode::Open,
        Some(raw_value) => match IdempotencyFailureMode::parse(raw_value) {
            Some(parsed) => parsed,
            None => {
                violations.push(FieldError::new(
                    "idempotencyFailMode",
                    "must be open or closed",
                ));
                IdempotencyFailureMode::Open
            }
        },
    };

    let readiness_check_timeout_secs = raw
        .readiness_check_timeout_secs
        .unwrap_or(DEFAULT_READINESS_CHECK_TIMEOUT_SECS);
    if readiness_check_timeout_secs == 0 {
        violations.push(FieldError::new(
            "readinessCheckTimeoutSecs",
            "must be greater than 0",
        ));
    }

    if !violations.is_empty() {
        return Err(ConfigError::Validation(violations));
    }

    Ok(Config {
        port,
        internal_port,
        internal_bind_address,
        env,
        jwt_enabled,
        jwt_secret,
        jwt_issuer,
        jwt_audience,
        jwt_leeway,
        rate_limit_rps,
        rate_limit_burst,
        trust_proxy,
        problem_base_url,
        audit_redact_email,
        http_read_header_timeout,
        http_max_header_bytes,
        max_request_size,
        database_url,
        db_pool: DbPoolConfig {
            min_conns: db_pool_min_conns,
            max_conns: db_pool_max_conns,
            max_lifetime: Duration::from_secs(db_pool_max_lifetime_secs),
        },
        log_level,
        shutdown_timeout: Duration::from_secs(shutdown_timeout_secs),
        idempotency_ttl: Duration::from_secs(idempotency_ttl_secs),
        idempotency_fail_mode,
        readiness_check_timeout: Duration::from_secs(readiness_check_timeout_secs),
    })
}

fn is_absolute_url_with_trailing_slash(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://")) && url.ends_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn valid_env() -> HashMap<String, String> {
        env(&[
            ("JWT_SECRET", "01234567890123456789012345678901"),
            ("DATABASE_URL", "postgres://localhost/app"),
        ])
    }

    #[test]
    fn loads_with_defaults_when_minimally_configured() {
        let config = Config::load_from(&valid_env()).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.internal_port, DEFAULT_INTERNAL_PORT);
        assert_eq!(config.log_level.as_str(), "info");
    }

    #[test]
    fn rejects_colliding_ports() {
        let mut vars = valid_env();
        vars.insert("PORT".to_string(), "9000".to_string());
        vars.insert("INTERNAL_PORT".to_string(), "9000".to_string());
        let result = Config::load_from(&vars);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn production_requires_jwt_enabled_and_secret() {
        let mut vars = env(&[("DATABASE_URL", "postgres://localhost/app")]);
        vars.insert("ENV".to_string(), "production".to_string());
        vars.insert("JWT_ENABLED".to_string(), "false".to_string());
        let result = Config::load_from(&vars);
        match result {
            Err(ConfigError::Validation(violations)) => {
                assert!(violations
                    .iter()
                    .any(|v| v.field == "jwtEnabled" && v.message.contains("ENV=production requires JWT_ENABLED=true")));
                assert!(violations.iter().any(|v| v.field == "jwtSecret"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        let mut vars = valid_env();
        vars.insert("JWT_SECRET".to_string(), "too-short".to_string());
        let result = Config::load_from(&vars);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_non_positive_rate_limit() {
        let mut vars = valid_env();
        vars.insert("RATE_LIMIT_RPS".to_string(), "0".to_string());
        let result = Config::load_from(&vars);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn reads_secret_from_file_variant() {
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("jwt_secret");
        std::fs::write(&secret_path, "01234567890123456789012345678901\n").unwrap();

        let mut vars = env(&[("DATABASE_URL", "postgres://localhost/app")]);
        vars.insert(
            "JWT_SECRET_FILE".to_string(),
            secret_path.to_string_lossy().to_string(),
        );
        let config = Config::load_from(&vars).unwrap();
        assert_eq!(config.jwt_secret, "01234567890123456789012345678901");
    }

    #[test]
    fn rejects_unknown_idempotency_fail_mode() {
        let mut vars = valid_env();
        vars.insert("IDEMPOTENCY_FAIL_MODE".to_string(), "sideways".to_string());
        let result = Config::load_from(&vars);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn accepts_jwt_issuer_and_audience() {
        let mut vars = valid_env();
        vars.insert("JWT_ISSUER".to_string(), "coresvc".to_string());
        vars.insert("JWT_AUDIENCE".to_string(), "coresvc-clients".to_string());
        let config = Config::load_from(&vars).unwrap();
        assert_eq!(config.jwt_issuer.as_deref(), Some("coresvc"));
        assert_eq!(config.jwt_audience.as_deref(), Some("coresvc-clients"));
    }

    #[test]
    fn db_pool_min_must_not_exceed_max() {
        let mut vars = valid_env();
        vars.insert("DB_POOL_MIN_CONNS".to_string(), "20".to_string());
        vars.insert("DB_POOL_MAX_CONNS".to_string(), "5".to_string());
        let result = Config::load_from(&vars);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
