//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BUNDLEHUB_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `BUNDLEHUB_BASE_URL` - Public URL of the API
//! - `BUNDLEHUB_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `VENDOR_BASE_URL` - Data bundle vendor API base URL
//! - `VENDOR_API_KEY` - Vendor API key
//! - `PAYSTACK_SECRET_KEY` - Payment gateway secret key (also signs webhooks)
//!
//! ## Optional
//! - `BUNDLEHUB_HOST` - Bind address (default: 127.0.0.1)
//! - `BUNDLEHUB_PORT` - Listen port (default: 3000)
//! - `PAYSTACK_BASE_URL` - Gateway API base URL (default: <https://api.paystack.co>)
//! - `PAYSTACK_CALLBACK_URL` - Where the gateway sends the customer after checkout
//! - `VENDOR_TIMEOUT_SECS` - Per-request vendor timeout (default: 20)
//! - `VENDOR_MAX_ATTEMPTS` - Vendor attempts for transient failures (default: 3)
//! - `MIN_WITHDRAWAL_AMOUNT` - Smallest withdrawal in cedis (default: 10.00)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated list of allowed origins
//! - `LOG_FORMAT` - `pretty` (default) or `json`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Secrets shorter than this are refused outright.
const SESSION_SECRET_MIN_LEN: usize = 32;
/// Shannon entropy floor, in bits per character.
const SECRET_MIN_ENTROPY: f64 = 3.3;

/// Fragments that show a secret was copied from a sample `.env`.
const SAMPLE_FRAGMENTS: &[&str] = &[
    "changeme",
    "placeholder",
    "example",
    "password",
    "secret-here",
    "your-",
    "xxxx",
    "todo",
];

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEnvVar(String),
    #[error("{0} is invalid: {1}")]
    InvalidEnvVar(String, String),
    #[error("{0} is not a usable secret: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Bundle vendor API configuration
    pub vendor: VendorConfig,
    /// Payment gateway configuration
    pub paystack: PaystackConfig,
    /// Smallest amount a store may withdraw
    pub min_withdrawal: Decimal,
    /// Origins allowed by the CORS layer
    pub cors_allowed_origins: Vec<String>,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Bundle vendor API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct VendorConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub timeout: Duration,
    /// Total attempts per call, including the first
    pub max_attempts: u32,
}

impl std::fmt::Debug for VendorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Payment gateway configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct PaystackConfig {
    pub base_url: String,
    pub secret_key: SecretString,
    pub callback_url: Option<String>,
}

impl std::fmt::Debug for PaystackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaystackConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BUNDLEHUB_DATABASE_URL")?;
        let host = parse_env("BUNDLEHUB_HOST", "127.0.0.1")?;
        let port = parse_env("BUNDLEHUB_PORT", "3000")?;
        let base_url = required("BUNDLEHUB_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BUNDLEHUB_BASE_URL".to_string(), e.to_string())
        })?;
        let session_secret = secret("BUNDLEHUB_SESSION_SECRET")?;
        check_secret_length("BUNDLEHUB_SESSION_SECRET", &session_secret)?;

        let vendor = VendorConfig::from_env()?;
        let paystack = PaystackConfig::from_env()?;

        let min_withdrawal: Decimal = parse_env("MIN_WITHDRAWAL_AMOUNT", "10.00")?;
        if min_withdrawal <= Decimal::ZERO {
            return Err(ConfigError::InvalidEnvVar(
                "MIN_WITHDRAWAL_AMOUNT".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let cors_allowed_origins = get_optional_env("CORS_ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let log_format = match get_env_or_default("LOG_FORMAT", "pretty").as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected 'pretty' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            vendor,
            paystack,
            min_withdrawal,
            cors_allowed_origins,
            log_format,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl VendorConfig {
    /// Load the vendor settings on their own, for tools that do not serve HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `VENDOR_*` variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = parse_env("VENDOR_TIMEOUT_SECS", "20")?;
        let max_attempts: u32 = parse_env("VENDOR_MAX_ATTEMPTS", "3")?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "VENDOR_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            base_url: trim_base_url(&required("VENDOR_BASE_URL")?),
            api_key: secret("VENDOR_API_KEY")?,
            timeout: Duration::from_secs(timeout_secs),
            max_attempts,
        })
    }
}

impl PaystackConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: trim_base_url(&get_env_or_default(
                "PAYSTACK_BASE_URL",
                "https://api.paystack.co",
            )),
            secret_key: secret("PAYSTACK_SECRET_KEY")?,
            callback_url: get_optional_env("PAYSTACK_CALLBACK_URL"),
        })
    }
}

/// Database URL alone (`BUNDLEHUB_DATABASE_URL`, then `DATABASE_URL`).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url("BUNDLEHUB_DATABASE_URL")
}

fn required(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_database_url(key: &str) -> Result<SecretString, ConfigError> {
    get_optional_env(key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|item| {
            let item = item.trim();
            (!item.is_empty()).then(|| item.to_string())
        })
        .collect()
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn check_secret_length(key: &str, secret: &SecretString) -> Result<(), ConfigError> {
    let len = secret.expose_secret().chars().count();
    if len < SESSION_SECRET_MIN_LEN {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("{len} characters, need at least {SESSION_SECRET_MIN_LEN}"),
        ));
    }
    Ok(())
}

/// Shannon entropy of `value` in bits per character.
fn entropy(value: &str) -> f64 {
    let mut counts = BTreeMap::<char, u32>::new();
    for c in value.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let total = f64::from(total);
    counts.values().fold(0.0, |acc, &n| {
        let p = f64::from(n) / total;
        acc - p * p.log2()
    })
}

/// Refuse sample values and low-entropy strings.
fn check_secret_strength(key: &str, value: &str) -> Result<(), ConfigError> {
    let lower = value.to_ascii_lowercase();
    if let Some(fragment) = SAMPLE_FRAGMENTS.iter().find(|f| lower.contains(*f)) {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("looks like a sample value (contains '{fragment}')"),
        ));
    }
    let bits = entropy(value);
    if bits < SECRET_MIN_ENTROPY {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("entropy {bits:.2} bits/char is below {SECRET_MIN_ENTROPY:.1}"),
        ));
    }
    Ok(())
}

fn secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required(key)?;
    check_secret_strength(key, &value)?;
    Ok(SecretString::from(value))
}
