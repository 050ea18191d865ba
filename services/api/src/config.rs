//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use ledger_digest_core::session::DEFAULT_TOKEN_TTL_MINUTES;
use ledger_digest_core::summary::DEFAULT_WINDOW_DAYS;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs the service on in-memory stores.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub token_ttl_minutes: i64,
    pub summary_window_days: u32,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// `None` logs reports instead of mailing them.
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_sender: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            summary_window_days: DEFAULT_WINDOW_DAYS,
            upload_dir: PathBuf::from("./uploads"),
            max_upload_bytes: 10 * 1024 * 1024,
            mail_api_url: None,
            mail_api_key: None,
            mail_sender: "no-reply@ledger-digest.local".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` wraps the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Load Server and Database Settings ---
        let bind_address = parse_or("BIND_ADDRESS", &lookup, defaults.bind_address)?;
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Session and Summary Policy ---
        let token_ttl_minutes: i64 =
            parse_or("TOKEN_TTL_MINUTES", &lookup, defaults.token_ttl_minutes)?;
        if token_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_MINUTES".to_string(),
                "must be a positive number of minutes".to_string(),
            ));
        }
        let summary_window_days: u32 =
            parse_or("SUMMARY_WINDOW_DAYS", &lookup, defaults.summary_window_days)?;
        if summary_window_days == 0 {
            return Err(ConfigError::InvalidValue(
                "SUMMARY_WINDOW_DAYS".to_string(),
                "must be a positive number of days".to_string(),
            ));
        }

        // --- Load Upload and Mail Settings ---
        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", &lookup, defaults.max_upload_bytes)?;

        let mail_api_url = lookup("MAIL_API_URL").filter(|v| !v.trim().is_empty());
        let mail_api_key = lookup("MAIL_API_KEY");
        if mail_api_url.is_some() && mail_api_key.is_none() {
            return Err(ConfigError::MissingVar("MAIL_API_KEY".to_string()));
        }
        let mail_sender = lookup("MAIL_SENDER").unwrap_or(defaults.mail_sender);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            token_ttl_minutes,
            summary_window_days,
            upload_dir,
            max_upload_bytes,
            mail_api_url,
            mail_api_key,
            mail_sender,
        })
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
