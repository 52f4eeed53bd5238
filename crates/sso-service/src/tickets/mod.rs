//! SSO tickets.
//!
//! # Ticket Chain
//!
//! ```text
//! login ── TgcManager::issue ──► TGC-<tgc> = subject      (TTL 18000s)
//!                   └──────────► u-<subject> = subject    (TTL 1800s)
//! access ─ StManager::issue(tgc) ► ST-<st> = subject      (TTL 3000s)
//! verify ─ StManager::consume(st) ► subject, key deleted  (single use)
//! logout ─ TgcManager::revoke(tgc) ► deletes TGC-<tgc> then u-<subject>
//! ```
//!
//! Expiry is owned by the store; nothing here keeps a clock.
//!
//! # Failure Model
//!
//! Operations return `Result`. A missing record is `Ok(None)` / `Ok(false)`;
//! `Err` means the store could not be reached or refused the command.
//! [`AuthDecision`] folds both into a single accept/reject at the boundary.

pub mod generator;
pub mod keys;
pub mod session;
pub mod st;
pub mod tgc;

pub use generator::generate_ticket;
pub use session::SessionIdentityCache;
pub use st::StManager;
pub use tgc::TgcManager;

use crate::errors::SsoError;
use crate::store::{StoreClient, StoreConnector};

/// TGC lifetime: 30 * 600 seconds.
pub const DEFAULT_TGC_TTL_SECONDS: u64 = 18_000;

/// ST lifetime.
pub const DEFAULT_ST_TTL_SECONDS: u64 = 3_000;

/// Session-identity lifetime when first set: 30 * 60 seconds.
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 1_800;

/// Session-identity lifetime after a refresh. Longer than the initial TTL,
/// matching the TGC refresh lifetime.
pub const DEFAULT_SESSION_REFRESH_TTL_SECONDS: u64 = 18_000;

/// Record lifetimes, in store seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketPolicy {
    pub tgc_ttl_seconds: u64,
    pub st_ttl_seconds: u64,
    pub session_ttl_seconds: u64,
    pub session_refresh_ttl_seconds: u64,
}

impl Default for TicketPolicy {
    fn default() -> Self {
        Self {
            tgc_ttl_seconds: DEFAULT_TGC_TTL_SECONDS,
            st_ttl_seconds: DEFAULT_ST_TTL_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_refresh_ttl_seconds: DEFAULT_SESSION_REFRESH_TTL_SECONDS,
        }
    }
}

/// The three ticket components wired to one store.
pub struct Tickets<C: StoreConnector> {
    pub tgc: TgcManager<C>,
    pub st: StManager<C>,
    pub sessions: SessionIdentityCache<C>,
}

impl<C: StoreConnector> Tickets<C> {
    pub fn new(store: StoreClient<C>, policy: TicketPolicy) -> Self {
        let sessions = SessionIdentityCache::new(store.clone(), policy);
        Self {
            tgc: TgcManager::new(store.clone(), sessions.clone(), policy),
            st: StManager::new(store, policy),
            sessions,
        }
    }
}

/// Outcome presented to a relying service.
///
/// Never issued, expired, already consumed and store unavailable all
/// collapse to `Rejected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// Authenticated as this subject.
    Accepted(String),
    Rejected,
}

impl AuthDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AuthDecision::Accepted(_))
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            AuthDecision::Accepted(subject) => Some(subject),
            AuthDecision::Rejected => None,
        }
    }
}

impl From<Result<Option<String>, SsoError>> for AuthDecision {
    fn from(result: Result<Option<String>, SsoError>) -> Self {
        match result {
            Ok(Some(subject)) if !subject.is_empty() => AuthDecision::Accepted(subject),
            _ => AuthDecision::Rejected,
        }
    }
}

/// Metrics outcome label for a ticket operation.
pub(crate) fn outcome<T>(result: &Result<T, SsoError>, found: bool) -> &'static str {
    match result {
        Err(_) => "error",
        Ok(_) if found => "success",
        Ok(_) => "absent",
    }
}
