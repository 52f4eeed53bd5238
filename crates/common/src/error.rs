//! Common error types for the SSO workspace.

use thiserror::Error;

/// Errors raised by the shared configuration types.
#[derive(Error, Debug)]
pub enum CommonError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}
