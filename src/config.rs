//! Configuration loader for the `codemetal-sensorquery` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
//! Parsing is written against a lookup function rather than `std::env` directly
//! so the rules can be exercised in tests without mutating process state.
use std::env;

use thiserror::Error;

use crate::nlq::OracleConfig;

/// Default chat-completion model used for translation.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default OpenAI-compatible API root.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Fatal startup configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env or environment")]
    Missing(&'static str),

    #[error("Invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Parse an optional numeric variable with a default value.
macro_rules! parse_var {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| ConfigError::Invalid {
                var: $var_name,
                reason: e.to_string(),
            })?
            .unwrap_or($default)
    };
}

/// Parse a required, non-blank string variable.
macro_rules! require_var {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing($var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Port the HTTP server binds on all interfaces.
    pub http_port: u16,

    /// Credential for the translation oracle.
    pub openai_api_key: String,

    /// Model identifier sent with every translation request.
    pub openai_model: String,

    /// API root of the OpenAI-compatible provider.
    pub openai_base_url: String,
}

/// Load configuration from the process environment.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
/// - `OPENAI_API_KEY` – translation oracle credential
///
/// Optional:
/// - `OPENAI_MODEL` – model identifier (default: `gpt-4o`)
/// - `OPENAI_BASE_URL` – API root (default: `https://api.openai.com/v1`)
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `HTTP_PORT` – listen port (default: 8080)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config, ConfigError> {
    // ---
    load_from(|key| env::var(key).ok())
}

/// Load configuration through an arbitrary key lookup.
pub fn load_from<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let db_url = require_var!(lookup, "DATABASE_URL");
    let openai_api_key = require_var!(lookup, "OPENAI_API_KEY");
    let openai_model = lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
    let openai_base_url = lookup("OPENAI_BASE_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
    let db_pool_max = parse_var!(lookup, "DB_POOL_MAX", u32, 5);
    let http_port = parse_var!(lookup, "HTTP_PORT", u16, 8080);

    Ok(Config {
        db_url,
        db_pool_max,
        http_port,
        openai_api_key,
        openai_model,
        openai_base_url,
    })
}

impl Config {
    /// Build the immutable oracle configuration handed to the translator.
    pub fn oracle(&self) -> OracleConfig {
        // ---
        OracleConfig {
            api_key: self.openai_api_key.clone(),
            model: self.openai_model.clone(),
            base_url: self.openai_base_url.clone(),
        }
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password and the API key while showing all other
    /// values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL    : {}", mask_db_url(&self.db_url));
        tracing::info!("  DB_POOL_MAX     : {}", self.db_pool_max);
        tracing::info!("  HTTP_PORT       : {}", self.http_port);
        tracing::info!("  OPENAI_API_KEY  : {}", mask_secret(&self.openai_api_key));
        tracing::info!("  OPENAI_MODEL    : {}", self.openai_model);
        tracing::info!("  OPENAI_BASE_URL : {}", self.openai_base_url);
    }
}

/// Replace the password segment of a connection URL with `****`.
fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // `postgres://host@...` has its only colon in the scheme
            if !db_url[colon_pos..].starts_with("://") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}

/// Keep only the last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    // ---
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}
