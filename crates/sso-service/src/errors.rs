//! SSO service error types.
//!
//! A missing key is never an error: expired, never issued and already
//! consumed tickets all surface as `Ok(None)` / `Ok(false)`. `SsoError` is
//! reserved for faults reaching the store.

use common::error::CommonError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SsoError {
    /// No connection became free within the configured wait bound.
    #[error("Timed out after {waited:?} waiting for a store connection")]
    PoolExhausted { waited: Duration },

    /// The pool has been shut down.
    #[error("Store connection pool is closed")]
    PoolClosed,

    /// Connecting failed or an established connection broke.
    #[error("Store connection error: {0}")]
    Connection(String),

    /// The store rejected a command.
    #[error("Redis error: {0}")]
    Redis(String),

    /// A connect or command exceeded the request timeout.
    #[error("Store request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SsoError {
    /// Whether the connection that produced this error must not be reused.
    pub fn is_connection_fault(&self) -> bool {
        matches!(self, SsoError::Connection(_) | SsoError::Timeout(_))
    }

    /// Whether a caller may retry the operation later.
    ///
    /// The service never retries on its own.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SsoError::PoolExhausted { .. }
                | SsoError::Connection(_)
                | SsoError::Redis(_)
                | SsoError::Timeout(_)
        )
    }

    /// Bounded label for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            SsoError::PoolExhausted { .. } | SsoError::PoolClosed => "pool",
            SsoError::Connection(_) | SsoError::Timeout(_) => "connection",
            SsoError::Redis(_) => "store",
            SsoError::Config(_) => "config",
            SsoError::Internal(_) => "internal",
        }
    }
}

impl From<CommonError> for SsoError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::Configuration(msg) => SsoError::Config(msg),
        }
    }
}
