//! Gateway configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GATEWAY_UPSTREAM_URL` - Page server that allowed requests are forwarded to
//!
//! ## Optional
//! - `GATEWAY_HOST` - Bind address (default: 127.0.0.1)
//! - `GATEWAY_PORT` - Listen port (default: 3000)
//! - `GATEWAY_BACKEND_URL` - REST backend base URL (default: <http://localhost:3001>)
//! - `GATEWAY_STATUS_CHECK` - Ask the backend whether the session is still active (default: true)
//! - `GATEWAY_STATUS_TIMEOUT_MS` - Timeout for that call (default: 3000)
//! - `GATEWAY_STATUS_POLICY` - `fail-open` or `fail-closed` when the backend is unreachable (default: fail-open)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";
const DEFAULT_STATUS_TIMEOUT_MS: u64 = 3000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Gateway application configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Page server allowed requests are proxied to
    pub upstream_url: Url,
    /// REST backend base URL (hosts `/check-status`)
    pub backend_url: Url,
    /// Remote status check settings
    pub status_check: StatusCheckConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Settings for the remote status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCheckConfig {
    /// Whether the gate calls the backend at all
    pub enabled: bool,
    /// Upper bound for the call
    pub timeout: Duration,
    /// What an unreachable backend means for the navigation
    pub policy: FailurePolicy,
}

impl Default for StatusCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_millis(DEFAULT_STATUS_TIMEOUT_MS),
            policy: FailurePolicy::FailOpen,
        }
    }
}

/// Behaviour when the status endpoint cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep routing on the locally decoded role.
    #[default]
    FailOpen,
    /// Treat the session as revoked.
    FailClosed,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-open" | "open" => Ok(Self::FailOpen),
            "fail-closed" | "closed" => Ok(Self::FailClosed),
            other => Err(format!("expected fail-open or fail-closed, got {other:?}")),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.parse_or("GATEWAY_HOST", "127.0.0.1")?;
        let port = env.parse_or("GATEWAY_PORT", "3000")?;
        let upstream_url = parse_url("GATEWAY_UPSTREAM_URL", &env.required("GATEWAY_UPSTREAM_URL")?)?;
        let backend_url = parse_url(
            "GATEWAY_BACKEND_URL",
            &env.or_default("GATEWAY_BACKEND_URL", DEFAULT_BACKEND_URL),
        )?;

        let enabled = parse_bool(
            "GATEWAY_STATUS_CHECK",
            &env.or_default("GATEWAY_STATUS_CHECK", "true"),
        )?;
        let timeout_ms: u64 = env.parse_or(
            "GATEWAY_STATUS_TIMEOUT_MS",
            &DEFAULT_STATUS_TIMEOUT_MS.to_string(),
        )?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "GATEWAY_STATUS_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let policy = env.parse_or("GATEWAY_STATUS_POLICY", "fail-open")?;

        Ok(Self {
            host,
            port,
            upstream_url,
            backend_url,
            status_check: StatusCheckConfig {
                enabled,
                timeout: Duration::from_millis(timeout_ms),
                policy,
            },
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable (or its default) with `FromStr`.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got {other:?}"),
        )),
    }
}
