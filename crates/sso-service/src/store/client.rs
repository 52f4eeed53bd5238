//! Store client: one borrowed connection per command.
//!
//! Every method acquires a connection from the pool, runs exactly one
//! command bounded by the request timeout, and lets the guard return the
//! connection on the way out. A connection that hit a connection fault or a
//! timeout is marked broken first, so it is closed instead of reused.
//!
//! Keys and values may carry tickets and are never logged here.

use crate::errors::SsoError;
use crate::observability::metrics;
use crate::store::connection::{StoreConnection, StoreConnector};
use crate::store::pool::StorePool;
use std::future::Future;
use std::time::Instant;
use tracing::{instrument, warn};

/// Convenience operations over a [`StorePool`].
///
/// Cheap to clone; clones share the pool.
pub struct StoreClient<C: StoreConnector> {
    pool: StorePool<C>,
}

impl<C: StoreConnector> Clone for StoreClient<C> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

impl<C: StoreConnector> StoreClient<C> {
    pub fn new(pool: StorePool<C>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &StorePool<C> {
        &self.pool
    }

    /// Value at `key`, or `None` if it is missing or expired.
    #[instrument(skip_all)]
    pub async fn get(&self, key: &str) -> Result<Option<String>, SsoError> {
        let mut conn = self.pool.acquire().await?;
        let result = self.bounded("get", conn.connection_mut()?.get(key)).await;
        conn.settle(&result);
        result
    }

    /// Set `key` without expiry, overwriting any previous value.
    #[instrument(skip_all)]
    pub async fn set(&self, key: &str, value: &str) -> Result<(), SsoError> {
        let mut conn = self.pool.acquire().await?;
        let result = self
            .bounded("set", conn.connection_mut()?.set(key, value))
            .await;
        conn.settle(&result);
        result
    }

    /// Set `key` with a TTL in seconds, overwriting any previous value.
    #[instrument(skip_all, fields(ttl_seconds = ttl_seconds))]
    pub async fn setex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<(), SsoError> {
        let mut conn = self.pool.acquire().await?;
        let result = self
            .bounded(
                "setex",
                conn.connection_mut()?.set_ex(key, ttl_seconds, value),
            )
            .await;
        conn.settle(&result);
        result
    }

    /// Reset the TTL of `key`.
    ///
    /// Returns `Ok(false)` when the key no longer exists; that is not an error.
    #[instrument(skip_all, fields(ttl_seconds = ttl_seconds))]
    pub async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool, SsoError> {
        let mut conn = self.pool.acquire().await?;
        let result = self
            .bounded("expire", conn.connection_mut()?.expire(key, ttl_seconds))
            .await;
        conn.settle(&result);
        result
    }

    /// Delete `key`, returning how many keys were removed (0 or 1).
    #[instrument(skip_all)]
    pub async fn delete(&self, key: &str) -> Result<u64, SsoError> {
        let mut conn = self.pool.acquire().await?;
        let result = self.bounded("del", conn.connection_mut()?.del(key)).await;
        conn.settle(&result);
        result
    }

    /// Decrement the integer at `key`; a missing key counts as 0.
    #[instrument(skip_all)]
    pub async fn decrement(&self, key: &str) -> Result<i64, SsoError> {
        let mut conn = self.pool.acquire().await?;
        let result = self.bounded("decr", conn.connection_mut()?.decr(key)).await;
        conn.settle(&result);
        result
    }

    /// Remaining TTL of `key` in seconds (`-2` missing, `-1` no expiry).
    #[instrument(skip_all)]
    pub async fn ttl(&self, key: &str) -> Result<i64, SsoError> {
        let mut conn = self.pool.acquire().await?;
        let result = self.bounded("ttl", conn.connection_mut()?.ttl(key)).await;
        conn.settle(&result);
        result
    }

    /// Read and delete `key` in a single store command.
    ///
    /// Of any number of concurrent callers for the same key, at most one
    /// observes the value.
    #[instrument(skip_all)]
    pub async fn take(&self, key: &str) -> Result<Option<String>, SsoError> {
        let mut conn = self.pool.acquire().await?;
        let result = self
            .bounded("getdel", conn.connection_mut()?.get_del(key))
            .await;
        conn.settle(&result);
        result
    }

    async fn bounded<T>(
        &self,
        command: &'static str,
        operation: impl Future<Output = Result<T, SsoError>>,
    ) -> Result<T, SsoError> {
        let limit = self.pool.config().request_timeout();
        let started = Instant::now();

        let result = match tokio::time::timeout(limit, operation).await {
            Ok(result) => result,
            Err(_) => Err(SsoError::Timeout(limit)),
        };

        match &result {
            Ok(_) => metrics::record_store_command(command, "success", started.elapsed()),
            Err(e) => {
                warn!(
                    target: "sso.store.client",
                    command = command,
                    error = %e,
                    "Store command failed"
                );
                metrics::record_store_command(command, "error", started.elapsed());
            }
        }

        result
    }
}
