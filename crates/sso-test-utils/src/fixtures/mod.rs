//! Pre-configured fixtures for SSO testing.
//!
//! Provides:
//! - Small pool configurations that exhaust quickly
//! - Subject identifiers
//! - Helpers wiring a `MockStore` into pools, clients and ticket managers

use crate::mock_store::MockStore;
use common::config::PoolConfig;
use sso_service::store::{StoreClient, StorePool};
use sso_service::tickets::{TicketPolicy, Tickets};

/// Subject used by the end-to-end login scenario.
pub const TEST_SUBJECT: &str = "user42";

/// A second subject for isolation checks.
pub const OTHER_SUBJECT: &str = "alice";

/// Pool limits sized for tests: a handful of connections and a short wait.
#[derive(Debug, Clone, Copy)]
pub struct TestPoolConfig {
    config: PoolConfig,
}

impl Default for TestPoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPoolConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PoolConfig {
                max_total: 4,
                max_idle: 2,
                max_wait_ms: 100,
                request_timeout_ms: 1_000,
                test_on_borrow: true,
            },
        }
    }

    #[must_use]
    pub fn with_max_total(mut self, max_total: usize) -> Self {
        self.config.max_total = max_total;
        self
    }

    #[must_use]
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.config.max_idle = max_idle;
        self
    }

    #[must_use]
    pub fn with_max_wait_ms(mut self, max_wait_ms: u64) -> Self {
        self.config.max_wait_ms = max_wait_ms;
        self
    }

    #[must_use]
    pub fn with_request_timeout_ms(mut self, request_timeout_ms: u64) -> Self {
        self.config.request_timeout_ms = request_timeout_ms;
        self
    }

    #[must_use]
    pub fn without_test_on_borrow(mut self) -> Self {
        self.config.test_on_borrow = false;
        self
    }

    #[must_use]
    pub fn build(self) -> PoolConfig {
        self.config
    }
}

/// Pool over `store` with the given limits.
///
/// # Panics
///
/// If `config` is invalid.
#[must_use]
pub fn test_pool(store: &MockStore, config: PoolConfig) -> StorePool<MockStore> {
    StorePool::new(store.clone(), config).expect("test pool config should be valid")
}

/// Store client over a default test pool.
#[must_use]
pub fn test_client(store: &MockStore) -> StoreClient<MockStore> {
    StoreClient::new(test_pool(store, TestPoolConfig::new().build()))
}

/// Ticket managers with production lifetimes over a default test pool.
///
/// The pool is returned as well so tests can inspect or close it.
#[must_use]
pub fn test_tickets(store: &MockStore) -> (Tickets<MockStore>, StorePool<MockStore>) {
    test_tickets_with_policy(store, TicketPolicy::default())
}

#[must_use]
pub fn test_tickets_with_policy(
    store: &MockStore,
    policy: TicketPolicy,
) -> (Tickets<MockStore>, StorePool<MockStore>) {
    let pool = test_pool(store, TestPoolConfig::new().build());
    let tickets = Tickets::new(StoreClient::new(pool.clone()), policy);
    (tickets, pool)
}
