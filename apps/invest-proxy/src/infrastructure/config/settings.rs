//! Proxy Configuration Settings
//!
//! Configuration types for the proxy, loaded from environment variables.

use std::path::PathBuf;

/// Default brokerage API base URL.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api-invest.tinkoff.ru/openapi";

/// Default failure log file, named after the service.
pub const DEFAULT_FAILURE_LOG: &str = "invest-proxy.log";

/// The two secrets the proxy holds.
#[derive(Clone)]
pub struct Credentials {
    trading_token: String,
    service_token: String,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(trading_token: String, service_token: String) -> Self {
        Self {
            trading_token,
            service_token,
        }
    }

    /// High-privilege token sent to the brokerage API.
    #[must_use]
    pub fn trading_token(&self) -> &str {
        &self.trading_token
    }

    /// Token the downstream consumer must present.
    #[must_use]
    pub fn service_token(&self) -> &str {
        &self.service_token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("trading_token", &"[REDACTED]")
            .field("service_token", &"[REDACTED]")
            .finish()
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Proxy listener port.
    pub port: u16,
    /// Health check and metrics HTTP port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            health_port: 8082,
        }
    }
}

/// Complete proxy configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Trading and service credentials.
    pub credentials: Credentials,
    /// Whether order actions are forwarded.
    pub orders_allowed: bool,
    /// Server port settings.
    pub server: ServerSettings,
    /// Brokerage API base URL, without a trailing slash.
    pub upstream_url: String,
    /// Failure log file.
    pub failure_log_path: PathBuf,
}

impl ProxyConfig {
    /// Configuration with the given credentials and defaults for everything else.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            orders_allowed: false,
            server: ServerSettings::default(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            failure_log_path: PathBuf::from(DEFAULT_FAILURE_LOG),
        }
    }

    /// Enable or disable order actions.
    #[must_use]
    pub const fn with_orders_allowed(mut self, orders_allowed: bool) -> Self {
        self.orders_allowed = orders_allowed;
        self
    }

    /// Point the proxy at another upstream, e.g. a sandbox or test server.
    #[must_use]
    pub fn with_upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Write failure records to `path`.
    #[must_use]
    pub fn with_failure_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.failure_log_path = path.into();
        self
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if either token is missing or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if either token is missing or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let trading_token = require(&lookup, "TINKOFF_API_TOKEN")?;
        let service_token = require(&lookup, "SERVICE_API_TOKEN")?;

        let orders_allowed = lookup("ORDERS_ALLOW").is_some_and(|v| parse_bool(&v));

        let server = ServerSettings {
            port: parse_u16(&lookup, "INVEST_PROXY_PORT", ServerSettings::default().port),
            health_port: parse_u16(
                &lookup,
                "INVEST_PROXY_HEALTH_PORT",
                ServerSettings::default().health_port,
            ),
        };

        let mut config = Self::new(Credentials::new(trading_token, service_token))
            .with_orders_allowed(orders_allowed);
        config.server = server;

        if let Some(url) = lookup("INVEST_PROXY_UPSTREAM_URL").filter(|v| !v.is_empty()) {
            config = config.with_upstream_url(url);
        }
        if let Some(path) = lookup("INVEST_PROXY_LOG_FILE").filter(|v| !v.is_empty()) {
            config = config.with_failure_log_path(path);
        }

        Ok(config)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn require<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyValue(key.to_string()));
    }
    Ok(value)
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn parse_u16<F>(lookup: &F, key: &str, default: u16) -> u16
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
