//! Store seam for the persistence worker.

use std::future::Future;

use parlor_database::{MessageStore, PersistOutcome, StoreError};
use parlor_messages::Envelope;

/// What the worker needs from the persistence store: the one atomic unit
/// combining the message insert and the conversation's last-activity bump.
///
/// Generic so worker tests can script failures without a database.
pub trait EnvelopeStore: Send + Sync {
    fn persist(
        &self,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<PersistOutcome, StoreError>> + Send;
}

impl EnvelopeStore for MessageStore {
    async fn persist(&self, envelope: &Envelope) -> Result<PersistOutcome, StoreError> {
        self.persist_envelope(envelope).await
    }
}
