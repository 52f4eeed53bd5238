//! Ticket-granting cookie manager.
//!
//! A TGC is the long-lived login credential. Its record maps the ticket to
//! the subject it was issued for:
//!
//! ```text
//! NONE ── issue ──► GRANTED ── refresh ──► GRANTED
//!                      │
//!                      ├── revoke ──► REVOKED (TGC and session marker gone)
//!                      └── TTL ─────► EXPIRED
//! ```
//!
//! Refresh and revoke on the same ticket are not serialized against each
//! other; whichever reaches the store last wins.

use crate::errors::SsoError;
use crate::observability::{hash_for_correlation, metrics};
use crate::store::{StoreClient, StoreConnector};
use crate::tickets::generator::generate_ticket;
use crate::tickets::keys::tgc_key;
use crate::tickets::session::SessionIdentityCache;
use crate::tickets::{outcome, TicketPolicy};
use tracing::{debug, info, instrument, warn};

const TICKET: &str = "tgc";

pub struct TgcManager<C: StoreConnector> {
    store: StoreClient<C>,
    sessions: SessionIdentityCache<C>,
    policy: TicketPolicy,
}

impl<C: StoreConnector> Clone for TgcManager<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            sessions: self.sessions.clone(),
            policy: self.policy,
        }
    }
}

impl<C: StoreConnector> TgcManager<C> {
    pub fn new(
        store: StoreClient<C>,
        sessions: SessionIdentityCache<C>,
        policy: TicketPolicy,
    ) -> Self {
        Self {
            store,
            sessions,
            policy,
        }
    }

    /// Grant a new TGC to `subject_id`.
    ///
    /// Writes the TGC record and then the subject's session marker. If the
    /// marker write fails the TGC record is already in place; the error is
    /// still returned and the caller should treat the login as failed.
    ///
    /// # Errors
    ///
    /// Any store failure from either write.
    #[instrument(skip_all, fields(subject = %hash_for_correlation(subject_id)))]
    pub async fn issue(&self, subject_id: &str) -> Result<String, SsoError> {
        let tgc = generate_ticket(subject_id);

        let result = match self
            .store
            .setex(&tgc_key(&tgc), self.policy.tgc_ttl_seconds, subject_id)
            .await
        {
            Ok(()) => self.sessions.set(subject_id).await,
            Err(e) => Err(e),
        };

        metrics::record_ticket_operation(TICKET, "issue", outcome(&result, true));

        match result {
            Ok(()) => {
                info!(
                    target: "sso.tickets.tgc",
                    ttl_seconds = self.policy.tgc_ttl_seconds,
                    "Ticket-granting cookie issued"
                );
                Ok(tgc)
            }
            Err(e) => {
                warn!(
                    target: "sso.tickets.tgc",
                    error = %e,
                    "Failed to issue ticket-granting cookie"
                );
                Err(e)
            }
        }
    }

    /// Reset the TGC lifetime to the full TTL.
    ///
    /// Returns `Ok(false)` if the ticket was never issued, has expired, or
    /// was revoked.
    #[instrument(skip_all)]
    pub async fn refresh(&self, tgc: &str) -> Result<bool, SsoError> {
        let result = self
            .store
            .expire(&tgc_key(tgc), self.policy.tgc_ttl_seconds)
            .await;

        if let Ok(false) = result {
            debug!(target: "sso.tickets.tgc", "No ticket-granting cookie to refresh");
        }
        metrics::record_ticket_operation(
            TICKET,
            "refresh",
            outcome(&result, matches!(result, Ok(true))),
        );
        result
    }

    /// Whether the TGC currently maps to a subject. Read-only.
    #[instrument(skip_all)]
    pub async fn validate(&self, tgc: &str) -> Result<bool, SsoError> {
        let result = self
            .lookup(tgc)
            .await
            .map(|subject| subject.is_some());

        metrics::record_ticket_operation(
            TICKET,
            "validate",
            outcome(&result, matches!(result, Ok(true))),
        );
        result
    }

    /// Subject bound to the TGC, if it is still live.
    #[instrument(skip_all)]
    pub async fn subject(&self, tgc: &str) -> Result<Option<String>, SsoError> {
        let result = self.lookup(tgc).await;

        metrics::record_ticket_operation(
            TICKET,
            "subject",
            outcome(&result, matches!(result, Ok(Some(_)))),
        );
        result
    }

    /// Log out: delete the TGC and then the subject's session marker.
    ///
    /// Revoking an unknown or already revoked ticket succeeds and changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Any store failure. If the TGC delete succeeded but the marker delete
    /// failed, the marker is left to expire on its own.
    #[instrument(skip_all)]
    pub async fn revoke(&self, tgc: &str) -> Result<(), SsoError> {
        let result = self.revoke_chain(tgc).await;

        match &result {
            Ok(Some(subject)) => {
                info!(
                    target: "sso.tickets.tgc",
                    subject = %hash_for_correlation(subject),
                    "Ticket-granting cookie revoked"
                );
            }
            Ok(None) => {
                debug!(target: "sso.tickets.tgc", "Revoke found no ticket-granting cookie");
            }
            Err(e) => {
                warn!(
                    target: "sso.tickets.tgc",
                    error = %e,
                    "Failed to revoke ticket-granting cookie"
                );
            }
        }
        metrics::record_ticket_operation(
            TICKET,
            "revoke",
            outcome(&result, matches!(result, Ok(Some(_)))),
        );

        result.map(|_| ())
    }

    async fn revoke_chain(&self, tgc: &str) -> Result<Option<String>, SsoError> {
        let key = tgc_key(tgc);
        let subject = self
            .store
            .get(&key)
            .await?
            .filter(|subject| !subject.is_empty());

        self.store.delete(&key).await?;

        if let Some(subject) = &subject {
            self.sessions.delete(subject).await?;
        }
        Ok(subject)
    }

    async fn lookup(&self, tgc: &str) -> Result<Option<String>, SsoError> {
        Ok(self
            .store
            .get(&tgc_key(tgc))
            .await?
            .filter(|subject| !subject.is_empty()))
    }
}
