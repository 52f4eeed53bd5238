//! # SSO Test Utilities
//!
//! Shared test utilities for the SSO ticket service.
//!
//! This crate provides an in-memory store and fixtures so ticket and pool
//! behaviour can be tested without a Redis server.
//!
//! ## Modules
//!
//! - `mock_store` - In-memory `StoreConnector` with TTLs and fault injection
//! - `fixtures` - Pool configurations, subjects and wiring helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sso_test_utils::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_example() {
//!     let store = MockStore::new();
//!     let (tickets, _pool) = test_tickets(&store);
//!
//!     let tgc = tickets.tgc.issue(TEST_SUBJECT).await.unwrap();
//!     tokio::time::advance(Duration::from_secs(18_001)).await;
//!     assert!(!tickets.tgc.validate(&tgc).await.unwrap());
//! }
//! ```
//!
//! ## Fault Injection
//!
//! ```rust,ignore
//! let store = MockStore::new();
//! store.fail_next_commands(1);     // next command fails as a broken transport
//! store.set_fail_pings(true);      // borrow-time health checks fail
//! store.set_refuse_connections(true);
//! store.set_command_delay(Some(Duration::from_secs(5)));
//! ```

pub mod fixtures;
pub mod mock_store;

pub use fixtures::*;
pub use mock_store::*;
