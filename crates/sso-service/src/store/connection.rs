//! Store capability traits.
//!
//! Each method maps to a single store command that is atomic on the store
//! side. Implementations report broken transports as
//! `SsoError::Connection` so the pool can discard them.

use crate::errors::SsoError;
use async_trait::async_trait;

/// One live connection to the key-value store.
#[async_trait]
pub trait StoreConnection: Send + 'static {
    /// Round-trip liveness check.
    async fn ping(&mut self) -> Result<(), SsoError>;

    async fn get(&mut self, key: &str) -> Result<Option<String>, SsoError>;

    async fn set(&mut self, key: &str, value: &str) -> Result<(), SsoError>;

    /// Set `key` with a TTL in seconds.
    async fn set_ex(&mut self, key: &str, seconds: u64, value: &str) -> Result<(), SsoError>;

    /// Reset the TTL of `key`. Returns `false` when the key does not exist.
    async fn expire(&mut self, key: &str, seconds: u64) -> Result<bool, SsoError>;

    /// Delete `key`, returning the number of keys removed.
    async fn del(&mut self, key: &str) -> Result<u64, SsoError>;

    /// Decrement the integer at `key` by one, returning the new value.
    async fn decr(&mut self, key: &str) -> Result<i64, SsoError>;

    /// Remaining TTL in seconds; `-1` without expiry, `-2` when missing.
    async fn ttl(&mut self, key: &str) -> Result<i64, SsoError>;

    /// Read and delete `key` in one command.
    async fn get_del(&mut self, key: &str) -> Result<Option<String>, SsoError>;
}

/// Opens new store connections for the pool.
#[async_trait]
pub trait StoreConnector: Send + Sync + 'static {
    type Connection: StoreConnection;

    async fn connect(&self) -> Result<Self::Connection, SsoError>;
}
