//! Service ticket manager.
//!
//! An ST is a short-lived, single-use proof that the holder of a live TGC
//! asked to reach one relying service. The relying service redeems it with
//! [`StManager::consume`], which deletes it in the same store command that
//! reads it.

use crate::errors::SsoError;
use crate::observability::{hash_for_correlation, metrics};
use crate::store::{StoreClient, StoreConnector};
use crate::tickets::generator::generate_ticket;
use crate::tickets::keys::{st_key, tgc_key};
use crate::tickets::{outcome, TicketPolicy};
use tracing::{debug, instrument, warn, Span};

const TICKET: &str = "st";

pub struct StManager<C: StoreConnector> {
    store: StoreClient<C>,
    policy: TicketPolicy,
}

impl<C: StoreConnector> Clone for StManager<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            policy: self.policy,
        }
    }
}

impl<C: StoreConnector> StManager<C> {
    pub fn new(store: StoreClient<C>, policy: TicketPolicy) -> Self {
        Self { store, policy }
    }

    /// Issue a service ticket for the subject behind `tgc`.
    ///
    /// Returns `Ok(None)` and writes nothing when the TGC is not live. The
    /// TGC is not checked again after the ST is written, so a revoke racing
    /// with this call can leave one valid ST behind until it expires.
    #[instrument(skip_all, fields(subject = tracing::field::Empty))]
    pub async fn issue(&self, tgc: &str) -> Result<Option<String>, SsoError> {
        let result = self.issue_for_tgc(tgc).await;

        match &result {
            Ok(Some(_)) => {}
            Ok(None) => debug!(target: "sso.tickets.st", "No live TGC, service ticket refused"),
            Err(e) => warn!(
                target: "sso.tickets.st",
                error = %e,
                "Failed to issue service ticket"
            ),
        }
        metrics::record_ticket_operation(
            TICKET,
            "issue",
            outcome(&result, matches!(result, Ok(Some(_)))),
        );
        result
    }

    async fn issue_for_tgc(&self, tgc: &str) -> Result<Option<String>, SsoError> {
        let Some(subject) = self
            .store
            .get(&tgc_key(tgc))
            .await?
            .filter(|subject| !subject.is_empty())
        else {
            return Ok(None);
        };
        Span::current().record("subject", hash_for_correlation(&subject).as_str());

        let st = generate_ticket(&subject);
        self.store
            .setex(&st_key(&st), self.policy.st_ttl_seconds, &subject)
            .await?;

        Ok(Some(st))
    }

    /// Redeem a service ticket.
    ///
    /// Returns the subject on the first call for a live ticket and `None`
    /// for every other call, including concurrent ones.
    #[instrument(skip_all)]
    pub async fn consume(&self, st: &str) -> Result<Option<String>, SsoError> {
        let result = self
            .store
            .take(&st_key(st))
            .await
            .map(|subject| subject.filter(|subject| !subject.is_empty()));

        if let Err(e) = &result {
            warn!(
                target: "sso.tickets.st",
                error = %e,
                "Failed to consume service ticket"
            );
        }
        metrics::record_ticket_operation(
            TICKET,
            "consume",
            outcome(&result, matches!(result, Ok(Some(_)))),
        );
        result
    }
}
