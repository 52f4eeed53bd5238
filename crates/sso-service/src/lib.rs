//! SSO Ticket Service Library
//!
//! Single sign-on tickets layered over a pooled, TTL-capable Redis store:
//!
//! - A long-lived ticket-granting credential (TGC) is issued once per login
//! - A TGC is exchanged for short-lived, single-use service tickets (ST)
//! - A per-subject session-identity record tracks liveness independently
//!
//! # Architecture
//!
//! ```text
//! TgcManager ──┐
//! StManager  ──┼── StoreClient ── StorePool ── StoreConnector (Redis | test double)
//! SessionIdentityCache ┘
//! ```
//!
//! Every store call borrows exactly one pooled connection and returns it on
//! every exit path. Expiry is delegated entirely to the store.
//!
//! # Modules
//!
//! - [`config`] - Service configuration from environment
//! - [`errors`] - Error types
//! - [`observability`] - Log correlation hashing and metrics
//! - [`store`] - Connection pool, store client and Redis backend
//! - [`tickets`] - Ticket generation and the TGC/ST/session managers

pub mod config;
pub mod errors;
pub mod observability;
pub mod store;
pub mod tickets;
