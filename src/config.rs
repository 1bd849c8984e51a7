//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server starts.
//!
//! ## Gatekeeper
//!
//! ```bash
//! export API_GATEWAY_KEY="change-me"
//! export RATE_LIMIT=5                  # requests per window
//! export RATE_LIMIT_WINDOW_SECONDS=60
//! export RATE_LIMIT_KEY=ip             # or "subject"
//! export EXCLUDED_PATHS="/,/docs,/login,/refresh,/monitoring"
//! ```
//!
//! ## Tokens
//!
//! ```bash
//! export SECRET_KEY="a-long-random-value"
//! export ALGORITHM=HS256               # HS256, HS384 or HS512
//! export ACCESS_TOKEN_EXPIRE_MINUTES=30
//! export REFRESH_TOKEN_EXPIRE_DAYS=7
//! ```
//!
//! ## Optional Variables
//!
//! - `LISTEN` - Bind address (default: `0.0.0.0:8000`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)
//! - `LOG_FILE_PATH` - Access log file, rotated daily (default: `logs/api.log`, empty disables)
//! - `BEHIND_PROXY` - Read client IP from `X-Forwarded-For` / `X-Real-IP` (default: `false`)
//! - `RATE_LIMIT_SWEEP_SECONDS` - Period of the stale-entry sweep (default: 60)
//! - `ADMIN_USERNAME` / `ADMIN_PASSWORD_HASH` - Seed user of the in-memory directory
//!
//! A value that is present but cannot be parsed is a startup error.

use anyhow::{Context, Result, anyhow};
use chrono::TimeDelta;
use jsonwebtoken::Algorithm;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::gateway::RateLimitKey;

/// Paths exempt from the gatekeeper when `EXCLUDED_PATHS` is not set.
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &[
    "/",
    "/docs",
    "/openapi.json",
    "/favicon.ico",
    "/redoc",
    "/login",
    "/refresh",
    "/monitoring",
    "/health",
];

/// The monitoring endpoint must never meter itself.
pub const MONITORING_PATH: &str = "/monitoring";

/// Access log location when `LOG_FILE_PATH` is not set.
pub const DEFAULT_LOG_FILE_PATH: &str = "logs/api.log";

/// Upper bound for either token lifetime (100 years).
pub const MAX_TOKEN_LIFETIME_DAYS: i64 = 36_500;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: String,
    /// File receiving the `apigate::access` events. `None` keeps them on stdout only.
    pub log_file_path: Option<String>,
    /// Shared secret expected in `X-API-GATEWAY-KEY`.
    pub gateway_key: String,
    /// Requests admitted per client per window.
    pub rate_limit: u32,
    pub rate_limit_window_seconds: u64,
    pub rate_limit_key: RateLimitKey,
    /// How often stale rate-limit entries are evicted.
    pub rate_limit_sweep_seconds: u64,
    /// When true, client IP is read from X-Forwarded-For / X-Real-IP.
    /// Enable only when the service is behind a trusted reverse proxy.
    pub behind_proxy: bool,
    /// HMAC secret used to sign session tokens.
    pub secret_key: String,
    /// JWT algorithm name (`HS256`, `HS384`, `HS512`).
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub excluded_paths: Vec<String>,
    pub admin_username: String,
    /// PHC-formatted hash of the seed user's password. When unset, the
    /// hash of `admin123` is computed at startup.
    pub admin_password_hash: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            log_file_path: Some(DEFAULT_LOG_FILE_PATH.to_string()),
            gateway_key: "default-secret-key".to_string(),
            rate_limit: 5,
            rate_limit_window_seconds: 60,
            rate_limit_key: RateLimitKey::Ip,
            rate_limit_sweep_seconds: 60,
            behind_proxy: false,
            secret_key: "supersecretkey123".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
            excluded_paths: DEFAULT_EXCLUDED_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            admin_username: "admin".to_string(),
            admin_password_hash: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but malformed.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let listen_addr = env::var("LISTEN").unwrap_or(defaults.listen_addr);
        let log_level = env::var("RUST_LOG").unwrap_or(defaults.log_level);
        let log_format = env::var("LOG_FORMAT").unwrap_or(defaults.log_format);
        let log_file_path = match env::var("LOG_FILE_PATH") {
            Ok(raw) if raw.trim().is_empty() => None,
            Ok(raw) => Some(raw.trim().to_string()),
            Err(_) => defaults.log_file_path,
        };
        let gateway_key = env::var("API_GATEWAY_KEY").unwrap_or(defaults.gateway_key);

        let rate_limit = parse_var("RATE_LIMIT", defaults.rate_limit)?;
        let rate_limit_window_seconds =
            parse_var("RATE_LIMIT_WINDOW_SECONDS", defaults.rate_limit_window_seconds)?;
        let rate_limit_key = parse_var("RATE_LIMIT_KEY", defaults.rate_limit_key)?;
        let rate_limit_sweep_seconds =
            parse_var("RATE_LIMIT_SWEEP_SECONDS", defaults.rate_limit_sweep_seconds)?;

        let behind_proxy = env::var("BEHIND_PROXY")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let secret_key = env::var("SECRET_KEY").unwrap_or(defaults.secret_key);
        let algorithm = env::var("ALGORITHM").unwrap_or(defaults.algorithm);
        let access_token_expire_minutes = parse_var(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            defaults.access_token_expire_minutes,
        )?;
        let refresh_token_expire_days =
            parse_var("REFRESH_TOKEN_EXPIRE_DAYS", defaults.refresh_token_expire_days)?;

        let excluded_paths = env::var("EXCLUDED_PATHS")
            .map(|raw| parse_path_list(&raw))
            .unwrap_or(defaults.excluded_paths);

        let admin_username = env::var("ADMIN_USERNAME").unwrap_or(defaults.admin_username);
        let admin_password_hash = env::var("ADMIN_PASSWORD_HASH").ok();

        Ok(Self {
            listen_addr,
            log_level,
            log_format,
            log_file_path,
            gateway_key,
            rate_limit,
            rate_limit_window_seconds,
            rate_limit_key,
            rate_limit_sweep_seconds,
            behind_proxy,
            secret_key,
            algorithm,
            access_token_expire_minutes,
            refresh_token_expire_days,
            excluded_paths,
            admin_username,
            admin_password_hash,
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `log_format` is not `text` or `json`
    /// - `listen_addr` is not `host:port`
    /// - the gateway key or signing secret is empty
    /// - the algorithm is not an HMAC algorithm
    /// - a limit or window is zero
    /// - a token lifetime is not positive or exceeds [`MAX_TOKEN_LIFETIME_DAYS`]
    pub fn validate(&self) -> Result<()> {
        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        if self.gateway_key.is_empty() {
            anyhow::bail!("API_GATEWAY_KEY must not be empty");
        }

        if self.secret_key.is_empty() {
            anyhow::bail!("SECRET_KEY must not be empty");
        }

        self.signing_algorithm()?;

        if self.rate_limit == 0 {
            anyhow::bail!("RATE_LIMIT must be at least 1");
        }
        if self.rate_limit_window_seconds == 0 {
            anyhow::bail!("RATE_LIMIT_WINDOW_SECONDS must be greater than 0");
        }
        if self.rate_limit_sweep_seconds == 0 {
            anyhow::bail!("RATE_LIMIT_SWEEP_SECONDS must be greater than 0");
        }

        self.access_token_ttl()?;
        self.refresh_token_ttl()?;

        if let Some(path) = self.excluded_paths.iter().find(|p| !p.starts_with('/')) {
            anyhow::bail!("EXCLUDED_PATHS entries must start with '/', got '{}'", path);
        }

        Ok(())
    }

    /// Resolves `algorithm` to a shared-secret JWT algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names and for asymmetric algorithms,
    /// which cannot be used with a single signing secret.
    pub fn signing_algorithm(&self) -> Result<Algorithm> {
        let algorithm = Algorithm::from_str(&self.algorithm)
            .map_err(|_| anyhow!("ALGORITHM '{}' is not a known JWT algorithm", self.algorithm))?;

        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            other => Err(anyhow!(
                "ALGORITHM must be HS256, HS384 or HS512, got {:?}",
                other
            )),
        }
    }

    /// Access token lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not positive or is out of range.
    pub fn access_token_ttl(&self) -> Result<TimeDelta> {
        token_lifetime(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            self.access_token_expire_minutes,
            TimeDelta::try_minutes,
        )
    }

    /// Refresh token lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not positive or is out of range.
    pub fn refresh_token_ttl(&self) -> Result<TimeDelta> {
        token_lifetime(
            "REFRESH_TOKEN_EXPIRE_DAYS",
            self.refresh_token_expire_days,
            TimeDelta::try_days,
        )
    }

    /// Prints configuration summary (without sensitive data).
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Gateway key: {}", mask_secret(&self.gateway_key));
        tracing::info!(
            "  Rate limit: {} requests / {}s per {}",
            self.rate_limit,
            self.rate_limit_window_seconds,
            self.rate_limit_key
        );
        tracing::info!("  Behind proxy: {}", self.behind_proxy);
        tracing::info!("  Token algorithm: {}", self.algorithm);
        tracing::info!(
            "  Token lifetimes: access {}m, refresh {}d",
            self.access_token_expire_minutes,
            self.refresh_token_expire_days
        );
        tracing::info!("  Excluded paths: {}", self.excluded_paths.join(", "));
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
        tracing::info!(
            "  Access log file: {}",
            self.log_file_path.as_deref().unwrap_or("disabled")
        );
    }
}

/// Parses an optional environment variable, falling back to `default`
/// only when the variable is absent.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has invalid value '{}': {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

/// Converts a configured lifetime, rejecting values chrono cannot represent
/// and values above [`MAX_TOKEN_LIFETIME_DAYS`].
fn token_lifetime(name: &str, value: i64, build: fn(i64) -> Option<TimeDelta>) -> Result<TimeDelta> {
    if value <= 0 {
        anyhow::bail!("{} must be positive, got {}", name, value);
    }

    build(value)
        .filter(|ttl| *ttl <= TimeDelta::days(MAX_TOKEN_LIFETIME_DAYS))
        .ok_or_else(|| {
            anyhow!(
                "{} is out of range (at most {} days), got {}",
                name,
                MAX_TOKEN_LIFETIME_DAYS,
                value
            )
        })
}

/// Splits a comma-separated path list, dropping blanks.
fn parse_path_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Masks a secret for logging, keeping only its length visible.
fn mask_secret(secret: &str) -> String {
    format!("*** ({} chars)", secret.chars().count())
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if variables are malformed or validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}
