//! Bounded store connection pool.
//!
//! # Bounds
//!
//! - At most `max_total` connections are borrowed at once. The bound is a
//!   semaphore permit carried by every `PooledConnection`.
//! - `acquire` waits at most `max_wait` for a permit and then fails with
//!   `SsoError::PoolExhausted`. Nothing is retried.
//! - At most `max_idle` connections are parked for reuse; extra healthy
//!   connections are closed on release.
//!
//! # Health
//!
//! With `test_on_borrow`, an idle connection is pinged before it is handed
//! out. A connection that fails the ping, or that saw a connection fault
//! while borrowed, is dropped and never returns to the idle set.
//!
//! There is no ping on return. Release happens in the guard's synchronous
//! `Drop`, so a returned connection is only checked at its next borrow.
//!
//! # Lifecycle
//!
//! ```rust,ignore
//! let pool = StorePool::connect(RedisConnector::new(&url)?, PoolConfig::default()).await?;
//! let store = StoreClient::new(pool.clone());
//! // ... serve ...
//! pool.close();
//! ```

use crate::errors::SsoError;
use crate::observability::metrics;
use crate::store::connection::{StoreConnection, StoreConnector};
use common::config::PoolConfig;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, instrument, trace, warn};

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Configured `max_total`.
    pub max_size: usize,
    /// Connections parked for reuse.
    pub idle: usize,
    /// Connections currently borrowed.
    pub in_use: usize,
}

/// Shared, cheaply cloneable handle to a connection pool.
pub struct StorePool<C: StoreConnector> {
    inner: Arc<PoolInner<C>>,
}

impl<C: StoreConnector> Clone for StorePool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PoolInner<C: StoreConnector> {
    connector: C,
    config: PoolConfig,
    permits: Arc<Semaphore>,
    idle: Mutex<VecDeque<C::Connection>>,
    closed: AtomicBool,
}

impl<C: StoreConnector> PoolInner<C> {
    fn lock_idle(&self) -> MutexGuard<'_, VecDeque<C::Connection>> {
        // Idle-set mutations cannot leave it inconsistent, so a poisoned
        // lock is still usable.
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pop_idle(&self) -> Option<C::Connection> {
        self.lock_idle().pop_back()
    }

    fn idle_count(&self) -> usize {
        self.lock_idle().len()
    }

    fn in_use(&self) -> usize {
        if self.closed.load(Ordering::Acquire) {
            return 0;
        }
        self.config
            .max_total
            .saturating_sub(self.permits.available_permits())
    }

    /// Return a connection after use. Runs before the borrower's permit is
    /// released so the next waiter can pick the connection up.
    fn park(&self, connection: C::Connection, broken: bool) {
        if broken {
            debug!(target: "sso.store.pool", "Discarding broken connection");
            metrics::record_connection_discarded("broken");
            return;
        }
        let mut idle = self.lock_idle();
        // Checked under the lock; `close` drains the idle set while holding it.
        if self.closed.load(Ordering::Acquire) {
            drop(idle);
            metrics::record_connection_discarded("pool_closed");
            return;
        }
        if idle.len() >= self.config.max_idle {
            drop(idle);
            trace!(target: "sso.store.pool", "Idle limit reached, closing connection");
            metrics::record_connection_discarded("idle_limit");
            return;
        }
        idle.push_back(connection);
    }

    fn publish_gauges(&self) {
        metrics::set_pool_connections(self.in_use(), self.idle_count());
    }
}

impl<C: StoreConnector> StorePool<C> {
    /// Create a pool. Connections are opened lazily on first use.
    ///
    /// # Errors
    ///
    /// Returns `SsoError::Config` if the limits are inconsistent.
    pub fn new(connector: C, config: PoolConfig) -> Result<Self, SsoError> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(PoolInner {
                connector,
                permits: Arc::new(Semaphore::new(config.max_total)),
                idle: Mutex::new(VecDeque::new()),
                closed: AtomicBool::new(false),
                config,
            }),
        })
    }

    /// Create a pool and open one connection up front.
    ///
    /// The connection is pinged and parked idle, so an unreachable store is
    /// reported at startup instead of on the first ticket request.
    ///
    /// # Errors
    ///
    /// Returns `SsoError::Config` for invalid limits, or the connect/ping
    /// failure.
    pub async fn connect(connector: C, config: PoolConfig) -> Result<Self, SsoError> {
        let pool = Self::new(connector, config)?;

        let mut conn = pool.acquire().await?;
        let ping = pool
            .bounded_by_request_timeout(conn.connection_mut()?.ping())
            .await;
        conn.settle(&ping);
        ping?;
        pool.release(conn);

        info!(
            target: "sso.store.pool",
            max_total = config.max_total,
            max_idle = config.max_idle,
            "Store connection pool ready"
        );

        Ok(pool)
    }

    /// Borrow a connection.
    ///
    /// Waits up to `max_wait` for a free slot. The returned guard gives the
    /// connection back to the pool when dropped.
    ///
    /// # Errors
    ///
    /// - `SsoError::PoolExhausted` if no slot frees up in time
    /// - `SsoError::PoolClosed` after [`StorePool::close`]
    /// - the connect error if a new connection has to be opened and fails
    #[instrument(skip_all)]
    pub async fn acquire(&self) -> Result<PooledConnection<C>, SsoError> {
        let started = Instant::now();
        let max_wait = self.inner.config.max_wait();

        let permit = match tokio::time::timeout(
            max_wait,
            Arc::clone(&self.inner.permits).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(SsoError::PoolClosed),
            Err(_) => {
                warn!(
                    target: "sso.store.pool",
                    waited_ms = max_wait.as_millis() as u64,
                    max_total = self.inner.config.max_total,
                    "Store connection pool exhausted"
                );
                metrics::record_pool_exhausted();
                metrics::record_pool_acquire("exhausted", started.elapsed());
                return Err(SsoError::PoolExhausted { waited: max_wait });
            }
        };

        let connection = match self.checkout().await {
            Ok(connection) => connection,
            Err(e) => {
                metrics::record_pool_acquire("error", started.elapsed());
                return Err(e);
            }
        };

        metrics::record_pool_acquire("success", started.elapsed());

        let guard = PooledConnection {
            connection: Some(connection),
            pool: Arc::clone(&self.inner),
            permit: Some(permit),
            borrowed_at: Instant::now(),
            broken: false,
        };
        self.inner.publish_gauges();

        Ok(guard)
    }

    /// Pick a healthy idle connection or open a new one. The caller already
    /// holds a permit.
    async fn checkout(&self) -> Result<C::Connection, SsoError> {
        while let Some(mut connection) = self.inner.pop_idle() {
            if !self.inner.config.test_on_borrow {
                return Ok(connection);
            }

            let health = self.bounded_by_request_timeout(connection.ping()).await;
            match health {
                Ok(()) => return Ok(connection),
                Err(e) => {
                    debug!(
                        target: "sso.store.pool",
                        error = %e,
                        "Idle connection failed health check, discarding"
                    );
                    metrics::record_connection_discarded("failed_health_check");
                }
            }
        }

        if self.inner.closed.load(Ordering::Acquire) {
            return Err(SsoError::PoolClosed);
        }

        let connection = self
            .bounded_by_request_timeout(self.inner.connector.connect())
            .await
            .map_err(|e| {
                warn!(
                    target: "sso.store.pool",
                    error = %e,
                    "Failed to open store connection"
                );
                e
            })?;

        metrics::record_connection_opened();
        debug!(target: "sso.store.pool", "Opened new store connection");

        Ok(connection)
    }

    async fn bounded_by_request_timeout<T>(
        &self,
        operation: impl std::future::Future<Output = Result<T, SsoError>>,
    ) -> Result<T, SsoError> {
        let limit = self.inner.config.request_timeout();
        match tokio::time::timeout(limit, operation).await {
            Ok(result) => result,
            Err(_) => Err(SsoError::Timeout(limit)),
        }
    }

    /// Give a connection back. Equivalent to dropping the guard.
    pub fn release(&self, conn: PooledConnection<C>) {
        drop(conn);
    }

    /// Shut the pool down.
    ///
    /// Pending and future `acquire` calls fail with `SsoError::PoolClosed`,
    /// idle connections are closed, and borrowed connections are closed when
    /// their guards drop.
    pub fn close(&self) {
        let drained = {
            let mut idle = self.inner.lock_idle();
            if self.inner.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            let count = idle.len();
            idle.clear();
            count
        };
        self.inner.permits.close();
        metrics::set_pool_connections(0, 0);

        info!(
            target: "sso.store.pool",
            closed_idle = drained,
            "Store connection pool closed"
        );
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            max_size: self.inner.config.max_total,
            idle: self.inner.idle_count(),
            in_use: self.inner.in_use(),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }
}

/// A borrowed connection.
///
/// Dropping the guard returns the connection to the pool (or closes it if
/// it was marked broken) and then frees the borrower's slot.
pub struct PooledConnection<C: StoreConnector> {
    connection: Option<C::Connection>,
    pool: Arc<PoolInner<C>>,
    permit: Option<OwnedSemaphorePermit>,
    borrowed_at: Instant,
    broken: bool,
}

impl<C: StoreConnector> PooledConnection<C> {
    /// Access the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns `SsoError::Internal` if the connection was already handed back.
    pub fn connection_mut(&mut self) -> Result<&mut C::Connection, SsoError> {
        self.connection
            .as_mut()
            .ok_or_else(|| SsoError::Internal("pooled connection already released".to_string()))
    }

    /// Prevent this connection from being reused.
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Mark the connection broken if `result` carries a connection fault.
    pub fn settle<T>(&mut self, result: &Result<T, SsoError>) {
        if let Err(e) = result {
            if e.is_connection_fault() {
                self.mark_broken();
            }
        }
    }

    /// Time since the connection was borrowed.
    pub fn borrowed_for(&self) -> Duration {
        self.borrowed_at.elapsed()
    }
}

impl<C: StoreConnector> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.pool.park(connection, self.broken);
        }
        drop(self.permit.take());
        self.pool.publish_gauges();

        trace!(
            target: "sso.store.pool",
            held_us = self.borrowed_at.elapsed().as_micros() as u64,
            broken = self.broken,
            "Released store connection"
        );
    }
}
