//! In-memory key-value store for SSO testing.
//!
//! `MockStore` is a `StoreConnector`; every connection it opens shares one
//! map. Expiry runs on `tokio::time::Instant`, so tests drive TTLs with
//! `tokio::time::pause` / `advance` instead of sleeping.
//!
//! Command semantics follow Redis for the subset the service uses:
//! `SET` clears any TTL, `EXPIRE` on a missing key returns `false`, `TTL`
//! returns `-2` for missing keys and `-1` for keys without expiry, and
//! `DECR` keeps the existing TTL.
//!
//! # Example
//!
//! ```rust,ignore
//! use sso_test_utils::MockStore;
//!
//! let store = MockStore::new().with_value("TGC-abc", "user42");
//! assert_eq!(store.value("TGC-abc").as_deref(), Some("user42"));
//!
//! store.fail_next_commands(2);
//! assert_eq!(store.connections_opened(), 0);
//! ```

use async_trait::async_trait;
use sso_service::errors::SsoError;
use sso_service::store::{StoreConnection, StoreConnector};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Shared in-memory store. Clones observe the same data and counters.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
}

#[derive(Debug, Default)]
struct MockStoreInner {
    entries: HashMap<String, Entry>,

    // Fault injection
    refuse_connections: bool,
    fail_pings: bool,
    broken_commands: usize,
    rejected_commands: usize,
    command_delay: Option<Duration>,

    // Counters
    connections_opened: usize,
    live_connections: usize,
    pings: usize,
    commands: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

impl MockStoreInner {
    /// Live entry at `key`. Expired entries are removed on access.
    fn live(&mut self, key: &str) -> Option<&mut Entry> {
        let now = Instant::now();
        if self.entries.get(key).is_some_and(|e| e.is_expired(now)) {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    fn remaining(&mut self, key: &str) -> Option<Option<Duration>> {
        let now = Instant::now();
        self.live(key)
            .map(|entry| entry.expires_at.map(|at| at.saturating_duration_since(now)))
    }
}

impl MockStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockStoreInner> {
        self.inner.lock().unwrap()
    }

    // ------------------------------------------------------------------------
    // Seeding and inspection
    // ------------------------------------------------------------------------

    /// Seed a key without expiry.
    #[must_use]
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.insert(key, value, None);
        self
    }

    /// Write a key directly, bypassing pools and fault injection.
    pub fn insert(&self, key: &str, value: &str, ttl: Option<Duration>) {
        self.lock().entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
    }

    /// Current value at `key`, honouring expiry.
    pub fn value(&self, key: &str) -> Option<String> {
        self.lock().live(key).map(|entry| entry.value.clone())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Remaining lifetime of `key`: `None` if missing, `Some(None)` if it
    /// never expires.
    pub fn ttl_of(&self, key: &str) -> Option<Option<Duration>> {
        self.lock().remaining(key)
    }

    /// Number of live keys whose name starts with `prefix`.
    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        let now = Instant::now();
        self.lock()
            .entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && !entry.is_expired(now))
            .count()
    }

    // ------------------------------------------------------------------------
    // Fault injection
    // ------------------------------------------------------------------------

    /// Make `connect` fail with a connection error.
    pub fn set_refuse_connections(&self, refuse: bool) {
        self.lock().refuse_connections = refuse;
    }

    /// Make `ping` fail with a connection error.
    pub fn set_fail_pings(&self, fail: bool) {
        self.lock().fail_pings = fail;
    }

    /// Fail the next `n` commands as broken transports (`SsoError::Connection`).
    pub fn fail_next_commands(&self, n: usize) {
        self.lock().broken_commands = n;
    }

    /// Fail the next `n` commands as store-side rejections (`SsoError::Redis`).
    pub fn reject_next_commands(&self, n: usize) {
        self.lock().rejected_commands = n;
    }

    /// Delay every command (not pings or connects) by `delay`.
    pub fn set_command_delay(&self, delay: Option<Duration>) {
        self.lock().command_delay = delay;
    }

    // ------------------------------------------------------------------------
    // Counters
    // ------------------------------------------------------------------------

    /// Connections successfully opened so far.
    pub fn connections_opened(&self) -> usize {
        self.lock().connections_opened
    }

    /// Connections opened and not yet dropped.
    pub fn live_connections(&self) -> usize {
        self.lock().live_connections
    }

    pub fn pings(&self) -> usize {
        self.lock().pings
    }

    /// Commands executed, excluding pings and injected failures.
    pub fn commands(&self) -> usize {
        self.lock().commands
    }

    /// Apply the configured delay, then consume one injected failure if any.
    async fn begin_command(&self) -> Result<(), SsoError> {
        let delay = self.lock().command_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.lock();
        if inner.broken_commands > 0 {
            inner.broken_commands -= 1;
            return Err(SsoError::Connection(
                "injected connection failure".to_string(),
            ));
        }
        if inner.rejected_commands > 0 {
            inner.rejected_commands -= 1;
            return Err(SsoError::Redis("injected command rejection".to_string()));
        }
        inner.commands += 1;
        Ok(())
    }
}

#[async_trait]
impl StoreConnector for MockStore {
    type Connection = MockConnection;

    async fn connect(&self) -> Result<MockConnection, SsoError> {
        let mut inner = self.lock();
        if inner.refuse_connections {
            return Err(SsoError::Connection(
                "injected connection refusal".to_string(),
            ));
        }
        inner.connections_opened += 1;
        inner.live_connections += 1;
        let id = inner.connections_opened;
        drop(inner);

        Ok(MockConnection {
            store: self.clone(),
            id,
        })
    }
}

/// One connection to a [`MockStore`].
#[derive(Debug)]
pub struct MockConnection {
    store: MockStore,
    id: usize,
}

impl MockConnection {
    /// Sequence number of this connection, starting at 1.
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.store.inner.lock() {
            inner.live_connections = inner.live_connections.saturating_sub(1);
        }
    }
}

fn ttl_instant(seconds: u64) -> Instant {
    Instant::now() + Duration::from_secs(seconds)
}

#[async_trait]
impl StoreConnection for MockConnection {
    async fn ping(&mut self) -> Result<(), SsoError> {
        let mut inner = self.store.lock();
        inner.pings += 1;
        if inner.fail_pings {
            return Err(SsoError::Connection("injected ping failure".to_string()));
        }
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>, SsoError> {
        self.store.begin_command().await?;
        Ok(self.store.lock().live(key).map(|entry| entry.value.clone()))
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<(), SsoError> {
        self.store.begin_command().await?;
        self.store.insert(key, value, None);
        Ok(())
    }

    async fn set_ex(&mut self, key: &str, seconds: u64, value: &str) -> Result<(), SsoError> {
        self.store.begin_command().await?;
        if seconds == 0 {
            return Err(SsoError::Redis(
                "invalid expire time in 'setex' command".to_string(),
            ));
        }
        self.store
            .insert(key, value, Some(Duration::from_secs(seconds)));
        Ok(())
    }

    async fn expire(&mut self, key: &str, seconds: u64) -> Result<bool, SsoError> {
        self.store.begin_command().await?;
        let mut inner = self.store.lock();
        match inner.live(key) {
            Some(entry) => {
                entry.expires_at = Some(ttl_instant(seconds));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn del(&mut self, key: &str) -> Result<u64, SsoError> {
        self.store.begin_command().await?;
        let mut inner = self.store.lock();
        let existed = inner.live(key).is_some();
        inner.entries.remove(key);
        Ok(u64::from(existed))
    }

    async fn decr(&mut self, key: &str) -> Result<i64, SsoError> {
        self.store.begin_command().await?;
        let mut inner = self.store.lock();
        let (current, expires_at) = match inner.live(key) {
            Some(entry) => {
                let current: i64 = entry.value.parse().map_err(|_| {
                    SsoError::Redis("value is not an integer or out of range".to_string())
                })?;
                (current, entry.expires_at)
            }
            None => (0, None),
        };

        let next = current - 1;
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn ttl(&mut self, key: &str) -> Result<i64, SsoError> {
        self.store.begin_command().await?;
        Ok(match self.store.lock().remaining(key) {
            None => -2,
            Some(None) => -1,
            // Redis rounds to the nearest second
            Some(Some(remaining)) => ((remaining.as_millis() + 500) / 1000) as i64,
        })
    }

    async fn get_del(&mut self, key: &str) -> Result<Option<String>, SsoError> {
        self.store.begin_command().await?;
        let mut inner = self.store.lock();
        let value = inner.live(key).map(|entry| entry.value.clone());
        inner.entries.remove(key);
        Ok(value)
    }
}
