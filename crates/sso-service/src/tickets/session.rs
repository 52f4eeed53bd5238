//! Session-identity cache.
//!
//! A liveness marker `u-<subjectId> = subjectId` kept next to the ticket
//! chain. It is keyed by subject, not by ticket, and refreshed on its own
//! schedule. TGC revocation deletes it as part of the logout cascade.

use crate::errors::SsoError;
use crate::observability::{hash_for_correlation, metrics};
use crate::store::{StoreClient, StoreConnector};
use crate::tickets::keys::session_key;
use crate::tickets::{outcome, TicketPolicy};
use tracing::{debug, instrument};

const TICKET: &str = "session";

pub struct SessionIdentityCache<C: StoreConnector> {
    store: StoreClient<C>,
    policy: TicketPolicy,
}

impl<C: StoreConnector> Clone for SessionIdentityCache<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            policy: self.policy,
        }
    }
}

impl<C: StoreConnector> SessionIdentityCache<C> {
    pub fn new(store: StoreClient<C>, policy: TicketPolicy) -> Self {
        Self { store, policy }
    }

    /// Write the marker with the initial session TTL.
    #[instrument(skip_all, fields(subject = %hash_for_correlation(subject_id)))]
    pub async fn set(&self, subject_id: &str) -> Result<(), SsoError> {
        let result = self
            .store
            .setex(
                &session_key(subject_id),
                self.policy.session_ttl_seconds,
                subject_id,
            )
            .await;

        metrics::record_ticket_operation(TICKET, "set", outcome(&result, true));
        result
    }

    /// Extend the marker to the refresh TTL.
    ///
    /// Returns `Ok(false)` if the marker has already expired.
    #[instrument(skip_all, fields(subject = %hash_for_correlation(subject_id)))]
    pub async fn refresh(&self, subject_id: &str) -> Result<bool, SsoError> {
        let result = self
            .store
            .expire(
                &session_key(subject_id),
                self.policy.session_refresh_ttl_seconds,
            )
            .await;

        if let Ok(false) = result {
            debug!(target: "sso.tickets.session", "No session identity to refresh");
        }
        metrics::record_ticket_operation(
            TICKET,
            "refresh",
            outcome(&result, matches!(result, Ok(true))),
        );
        result
    }

    #[instrument(skip_all, fields(subject = %hash_for_correlation(subject_id)))]
    pub async fn get(&self, subject_id: &str) -> Result<Option<String>, SsoError> {
        let result = self.store.get(&session_key(subject_id)).await;

        metrics::record_ticket_operation(
            TICKET,
            "get",
            outcome(&result, matches!(result, Ok(Some(_)))),
        );
        result
    }

    /// Remove the marker. Returns whether one existed.
    #[instrument(skip_all, fields(subject = %hash_for_correlation(subject_id)))]
    pub async fn delete(&self, subject_id: &str) -> Result<bool, SsoError> {
        let result = self
            .store
            .delete(&session_key(subject_id))
            .await
            .map(|removed| removed > 0);

        metrics::record_ticket_operation(
            TICKET,
            "delete",
            outcome(&result, matches!(result, Ok(true))),
        );
        result
    }
}
