//! Redis backend for the store traits.
//!
//! Each pooled connection owns one `MultiplexedConnection`. The pool, not
//! the multiplexer, bounds how many are open.

use crate::errors::SsoError;
use crate::store::connection::{StoreConnection, StoreConnector};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use secrecy::{ExposeSecret, SecretString};
use tracing::error;

/// Opens Redis connections for the pool.
pub struct RedisConnector {
    client: Client,
}

impl RedisConnector {
    /// Parse the connection URL. No connection is opened yet.
    ///
    /// # Errors
    ///
    /// Returns `SsoError::Config` if the URL is not a valid Redis URL.
    pub fn new(redis_url: &SecretString) -> Result<Self, SsoError> {
        let client = Client::open(redis_url.expose_secret()).map_err(|e| {
            // Note: Do NOT log redis_url as it may contain credentials
            // (e.g., redis://:password@host:port)
            error!(
                target: "sso.store.redis",
                error = %e,
                "Failed to open Redis client"
            );
            SsoError::Config(format!("Failed to open Redis client: {e}"))
        })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl StoreConnector for RedisConnector {
    type Connection = RedisConnection;

    async fn connect(&self) -> Result<RedisConnection, SsoError> {
        let connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;

        Ok(RedisConnection { connection })
    }
}

/// One Redis connection held by the pool.
pub struct RedisConnection {
    connection: MultiplexedConnection,
}

/// Transport-level failures poison the connection; command errors do not.
fn map_redis_error(e: RedisError) -> SsoError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
    {
        SsoError::Connection(e.to_string())
    } else {
        SsoError::Redis(e.to_string())
    }
}

#[async_trait]
impl StoreConnection for RedisConnection {
    async fn ping(&mut self) -> Result<(), SsoError> {
        let _: String = redis::cmd("PING")
            .query_async(&mut self.connection)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>, SsoError> {
        self.connection.get(key).await.map_err(map_redis_error)
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<(), SsoError> {
        self.connection
            .set(key, value)
            .await
            .map_err(map_redis_error)
    }

    async fn set_ex(&mut self, key: &str, seconds: u64, value: &str) -> Result<(), SsoError> {
        redis::cmd("SETEX")
            .arg(key)
            .arg(seconds)
            .arg(value)
            .query_async(&mut self.connection)
            .await
            .map_err(map_redis_error)
    }

    async fn expire(&mut self, key: &str, seconds: u64) -> Result<bool, SsoError> {
        let updated: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(seconds)
            .query_async(&mut self.connection)
            .await
            .map_err(map_redis_error)?;
        Ok(updated == 1)
    }

    async fn del(&mut self, key: &str) -> Result<u64, SsoError> {
        self.connection.del(key).await.map_err(map_redis_error)
    }

    async fn decr(&mut self, key: &str) -> Result<i64, SsoError> {
        self.connection.decr(key, 1).await.map_err(map_redis_error)
    }

    async fn ttl(&mut self, key: &str) -> Result<i64, SsoError> {
        self.connection.ttl(key).await.map_err(map_redis_error)
    }

    async fn get_del(&mut self, key: &str) -> Result<Option<String>, SsoError> {
        redis::cmd("GETDEL")
            .arg(key)
            .query_async(&mut self.connection)
            .await
            .map_err(map_redis_error)
    }
}
