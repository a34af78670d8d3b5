// Centralized configuration management for notesync-core.
// JavaScript-style config pattern - load ALL env vars ONCE at startup.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Global application configuration, loaded once at startup.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    #[cfg(test)]
    dotenv::dotenv().ok();

    AppConfig::from_env().expect("Failed to load configuration")
});

/// Complete application configuration.
///
/// Configuration-file parsing (the layered `$HOME`/`$PWD` `.conf` merge) is
/// an out-of-scope external interface; environment variables (optionally
/// overridden by a `.env` file) stand in for it here, matching defaults for
/// every option that format would otherwise provide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub rust_log: String,

    /// `server.listen`
    pub bind_address: String,

    /// `database.path`
    pub database_path: String,
    pub database_max_connections: u32,

    /// `auth.private_key`
    pub private_key_path: String,
    /// `auth.access_token_expiry`, in seconds
    pub access_token_expiry_secs: u64,
    /// `auth.refresh_token_expiry`, in seconds
    pub refresh_token_expiry_secs: u64,
    pub jwt_audience: String,
    pub jwt_issuer: String,

    pub bcrypt_cost: u32,

    pub rate_limit_max_requests: u32,
    pub rate_limit_window_seconds: u64,
    pub rate_limit_sweep_interval_seconds: u64,

    pub request_body_limit_bytes: usize,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
}

/// Environment type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "test" => Environment::Test,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults spec.md §6 documents for the (out-of-scope) config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let get_or_default = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let parse_u32_or_default = |key: &str, default: &str| -> Result<u32, ConfigError> {
            get_or_default(key, default)
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string(), "not a valid u32".into()))
        };

        let parse_u64_or_default = |key: &str, default: &str| -> Result<u64, ConfigError> {
            get_or_default(key, default)
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string(), "not a valid u64".into()))
        };

        let environment_str = get_or_default("ENVIRONMENT", "development");
        let environment = Environment::from(environment_str);

        let bind_address = get_or_default("BIND_ADDRESS", "127.0.0.1:8080");
        let database_path = get_or_default("DATABASE_PATH", "notesync.db");
        let database_max_connections = parse_u32_or_default("DATABASE_MAX_CONNECTIONS", "10")?;

        let private_key_path = get_or_default("PRIVATE_KEY_PATH", "notesync.key");
        let access_token_expiry_secs = parse_u64_or_default("ACCESS_TOKEN_EXPIRY_SECS", "900")?; // 15m
        let refresh_token_expiry_secs =
            parse_u64_or_default("REFRESH_TOKEN_EXPIRY_SECS", "2592000")?; // 720h
        let jwt_audience = get_or_default("JWT_AUDIENCE", "notesync");
        let jwt_issuer = get_or_default("JWT_ISSUER", "notesync");

        let bcrypt_cost = parse_u32_or_default("BCRYPT_COST", "12")?;
        if bcrypt_cost < 12 {
            return Err(ConfigError::InvalidValue(
                "BCRYPT_COST".to_string(),
                "must be at least 12".to_string(),
            ));
        }

        let rate_limit_max_requests = parse_u32_or_default("RATE_LIMIT_MAX_REQUESTS", "20")?;
        let rate_limit_window_seconds = parse_u64_or_default("RATE_LIMIT_WINDOW_SECONDS", "60")?;
        let rate_limit_sweep_interval_seconds =
            parse_u64_or_default("RATE_LIMIT_SWEEP_INTERVAL_SECONDS", "300")?;

        let request_body_limit_bytes =
            parse_u32_or_default("REQUEST_BODY_LIMIT_BYTES", "1048576")? as usize;
        let read_timeout_secs = parse_u64_or_default("READ_TIMEOUT_SECS", "10")?;
        let write_timeout_secs = parse_u64_or_default("WRITE_TIMEOUT_SECS", "30")?;
        let idle_timeout_secs = parse_u64_or_default("IDLE_TIMEOUT_SECS", "60")?;
        let shutdown_grace_secs = parse_u64_or_default("SHUTDOWN_GRACE_SECS", "5")?;

        let rust_log = get_or_default("RUST_LOG", "info");

        if bind_address.is_empty() || database_path.is_empty() || private_key_path.is_empty() {
            return Err(ConfigError::InvalidValue(
                "server/database/auth".to_string(),
                "required configuration values must be non-empty".to_string(),
            ));
        }

        Ok(Self {
            environment,
            rust_log,
            bind_address,
            database_path,
            database_max_connections,
            private_key_path,
            access_token_expiry_secs,
            refresh_token_expiry_secs,
            jwt_audience,
            jwt_issuer,
            bcrypt_cost,
            rate_limit_max_requests,
            rate_limit_window_seconds,
            rate_limit_sweep_interval_seconds,
            request_body_limit_bytes,
            read_timeout_secs,
            write_timeout_secs,
            idle_timeout_secs,
            shutdown_grace_secs,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// Get the global configuration instance.
pub fn config() -> &'static AppConfig {
    &CONFIG
}
