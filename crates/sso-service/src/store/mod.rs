//! Pooled access to the key-value store.
//!
//! This module provides:
//! - `StoreConnector` / `StoreConnection` - the narrow capability interface
//!   the ticket layer needs from a store
//! - `StorePool` - bounded connection pool with borrow-time health checks
//! - `StoreClient` - one-command-per-borrow convenience operations
//! - `RedisConnector` - the production backend
//!
//! # Resource Discipline
//!
//! A connection is never held across two logical operations. Each
//! `StoreClient` call acquires a `PooledConnection`, runs exactly one
//! command, and the guard returns the connection when it goes out of scope,
//! including on error paths.

pub mod client;
pub mod connection;
pub mod pool;
pub mod redis;

pub use client::StoreClient;
pub use connection::{StoreConnection, StoreConnector};
pub use pool::{PoolStatus, PooledConnection, StorePool};
pub use self::redis::{RedisConnection, RedisConnector};
