//! SSO service configuration.
//!
//! Configuration is loaded from environment variables. The store URL may
//! embed a password and is redacted in Debug output.

use crate::tickets::{
    TicketPolicy, DEFAULT_SESSION_REFRESH_TTL_SECONDS, DEFAULT_SESSION_TTL_SECONDS,
    DEFAULT_ST_TTL_SECONDS, DEFAULT_TGC_TTL_SECONDS,
};
use common::config::{ObservabilityConfig, PoolConfig, RedisConfig};
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

/// Default Prometheus exporter bind address.
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:9095";

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone)]
pub struct Config {
    /// Store URL and pool limits.
    pub redis: RedisConfig,

    /// Ticket and session lifetimes.
    pub tickets: TicketPolicy,

    /// Prometheus exporter bind address (default: "0.0.0.0:9095").
    pub metrics_bind_address: SocketAddr,

    pub observability: ObservabilityConfig,
}

/// Custom Debug implementation that redacts the store URL.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("redis_url", &"[REDACTED]")
            .field("pool", &self.redis.pool)
            .field("tickets", &self.tickets)
            .field("metrics_bind_address", &self.metrics_bind_address)
            .field("observability", &self.observability)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Parse `name` if present, otherwise fall back to `default`.
fn parse_or<T>(vars: &HashMap<String, String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match vars.get(name) {
        Some(value_str) => value_str.trim().parse().map_err(|e| {
            ConfigError::InvalidValue(format!("{name} must be a valid value, got '{value_str}': {e}"))
        }),
        None => Ok(default),
    }
}

/// Lifetimes of zero would make every record expire immediately.
fn parse_ttl(vars: &HashMap<String, String>, name: &str, default: u64) -> Result<u64, ConfigError> {
    let value = parse_or(vars, name, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidValue(format!(
            "{name} must be greater than 0"
        )));
    }
    Ok(value)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let url = SecretString::from(
            vars.get("REDIS_URL")
                .ok_or_else(|| ConfigError::MissingEnvVar("REDIS_URL".to_string()))?
                .clone(),
        );

        let defaults = PoolConfig::default();
        let pool = PoolConfig {
            max_total: parse_or(vars, "SSO_POOL_MAX_TOTAL", defaults.max_total)?,
            max_idle: parse_or(vars, "SSO_POOL_MAX_IDLE", defaults.max_idle)?,
            max_wait_ms: parse_or(vars, "SSO_POOL_MAX_WAIT_MS", defaults.max_wait_ms)?,
            request_timeout_ms: parse_or(
                vars,
                "SSO_STORE_TIMEOUT_MS",
                defaults.request_timeout_ms,
            )?,
            test_on_borrow: parse_or(vars, "SSO_POOL_TEST_ON_BORROW", defaults.test_on_borrow)?,
        };
        pool.validate()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let tickets = TicketPolicy {
            tgc_ttl_seconds: parse_ttl(vars, "SSO_TGC_TTL_SECONDS", DEFAULT_TGC_TTL_SECONDS)?,
            st_ttl_seconds: parse_ttl(vars, "SSO_ST_TTL_SECONDS", DEFAULT_ST_TTL_SECONDS)?,
            session_ttl_seconds: parse_ttl(
                vars,
                "SSO_SESSION_TTL_SECONDS",
                DEFAULT_SESSION_TTL_SECONDS,
            )?,
            session_refresh_ttl_seconds: parse_ttl(
                vars,
                "SSO_SESSION_REFRESH_TTL_SECONDS",
                DEFAULT_SESSION_REFRESH_TTL_SECONDS,
            )?,
        };

        let metrics_bind_address = vars
            .get("SSO_METRICS_BIND_ADDRESS")
            .map_or(DEFAULT_METRICS_BIND_ADDRESS, String::as_str);
        let metrics_bind_address: SocketAddr = metrics_bind_address.parse().map_err(|e| {
            ConfigError::InvalidValue(format!(
                "SSO_METRICS_BIND_ADDRESS must be a socket address, got '{metrics_bind_address}': {e}"
            ))
        })?;

        let observability = ObservabilityConfig {
            log_level: vars
                .get("SSO_LOG_LEVEL")
                .cloned()
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            json_logs: parse_or(vars, "SSO_LOG_JSON", false)?,
        };

        Ok(Config {
            redis: RedisConfig { url, pool },
            tickets,
            metrics_bind_address,
            observability,
        })
    }
}
