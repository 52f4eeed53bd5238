//! Common configuration types for the key-value store connection.

use crate::error::CommonError;
use crate::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum number of connections (idle plus borrowed).
pub const DEFAULT_POOL_MAX_TOTAL: usize = 100;

/// Default maximum number of idle connections kept for reuse.
pub const DEFAULT_POOL_MAX_IDLE: usize = 20;

/// Default time to wait for a free connection, in milliseconds.
pub const DEFAULT_POOL_MAX_WAIT_MS: u64 = 20_000;

/// Default per-request timeout, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Upper limit accepted for `max_total` (and so for `max_idle`).
pub const MAX_POOL_CONNECTIONS: usize = 10_000;

/// Connection pool limits.
///
/// These are fixed for the lifetime of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of connections the pool will hand out at once
    pub max_total: usize,
    /// Maximum number of idle connections retained after release
    pub max_idle: usize,
    /// How long `acquire` waits for a free connection before failing
    pub max_wait_ms: u64,
    /// Upper bound for connecting and for each store command
    pub request_timeout_ms: u64,
    /// Ping idle connections before handing them out
    pub test_on_borrow: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_total: DEFAULT_POOL_MAX_TOTAL,
            max_idle: DEFAULT_POOL_MAX_IDLE,
            max_wait_ms: DEFAULT_POOL_MAX_WAIT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            test_on_borrow: true,
        }
    }
}

impl PoolConfig {
    /// Maximum wait for a connection as a `Duration`.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    /// Per-request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Check that the limits are consistent.
    ///
    /// # Errors
    ///
    /// Returns `CommonError::Configuration` when `max_total` or
    /// `request_timeout_ms` is zero, when `max_total` is above
    /// [`MAX_POOL_CONNECTIONS`], or when `max_idle` exceeds `max_total`.
    pub fn validate(&self) -> Result<(), CommonError> {
        if self.max_total == 0 {
            return Err(CommonError::Configuration(
                "pool max_total must be greater than zero".to_string(),
            ));
        }
        if self.max_total > MAX_POOL_CONNECTIONS {
            return Err(CommonError::Configuration(format!(
                "pool max_total ({}) must not exceed {MAX_POOL_CONNECTIONS}",
                self.max_total
            )));
        }
        if self.max_idle > self.max_total {
            return Err(CommonError::Configuration(format!(
                "pool max_idle ({}) must not exceed max_total ({})",
                self.max_idle, self.max_total
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(CommonError::Configuration(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL (may embed credentials)
    pub url: SecretString,
    /// Connection pool limits
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Enable JSON-formatted logs
    pub json_logs: bool,
}
