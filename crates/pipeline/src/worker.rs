//! Record-level persistence logic, independent of the log client.
//!
//! [`PersistenceWorker::process_record`] takes one raw payload to a final
//! disposition: commit, dead-letter, or abandon. The pause/resume cycle and
//! the bounded retry budget live here so they can be exercised without a
//! broker.

use std::time::Duration;

use parlor_database::PersistOutcome;
use parlor_messages::Envelope;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::state::ConsumerMode;
use crate::store::EnvelopeStore;

/// Tunables for the worker, taken from the Kafka section of the app config.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// How long the consumer stays paused after a persistence failure.
    pub resume_delay: Duration,
    /// Persist attempts per record before dead-lettering.
    pub max_attempts: u32,
}

impl WorkerSettings {
    pub fn from_config(config: &parlor_config::KafkaConfig) -> Self {
        Self {
            resume_delay: Duration::from_secs(config.resume_delay_seconds),
            max_attempts: config.max_attempts.max(1),
        }
    }
}

/// Final decision for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordDisposition {
    /// Advance past the record (persisted, duplicate, or malformed skip).
    Commit,
    /// Attempt budget exhausted; divert to the dead-letter topic, then
    /// advance.
    DeadLetter,
    /// Shutdown interrupted processing; do not advance, the record will be
    /// redelivered on the next start.
    Abandon,
}

pub struct PersistenceWorker<S> {
    store: S,
    settings: WorkerSettings,
    mode: watch::Sender<ConsumerMode>,
    shutdown: watch::Receiver<bool>,
}

impl<S: EnvelopeStore> PersistenceWorker<S> {
    pub fn new(store: S, settings: WorkerSettings, shutdown: watch::Receiver<bool>) -> Self {
        let (mode, _) = watch::channel(ConsumerMode::Running);
        Self {
            store,
            settings,
            mode,
            shutdown,
        }
    }

    /// Observe RUNNING/PAUSED transitions.
    pub fn mode(&self) -> watch::Receiver<ConsumerMode> {
        self.mode.subscribe()
    }

    /// Drive one record to its disposition.
    ///
    /// Malformed payloads are logged and skipped without pausing. Transient
    /// store failures pause the worker for the resume delay and then retry
    /// the same record; after `max_attempts` the record is handed to the
    /// dead-letter path.
    pub async fn process_record(&self, payload: Option<&[u8]>) -> RecordDisposition {
        let Some(payload) = payload else {
            warn!("log record without payload, skipping");
            return RecordDisposition::Commit;
        };

        let envelope = match Envelope::from_json(payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "malformed log record, skipping");
                return RecordDisposition::Commit;
            }
        };

        let mut attempts = 0u32;
        loop {
            match self.store.persist(&envelope).await {
                Ok(PersistOutcome::Stored) => {
                    info!(conversation_id = %envelope.chat_id, "envelope persisted");
                    return RecordDisposition::Commit;
                }
                Ok(PersistOutcome::Duplicate) => {
                    debug!(
                        conversation_id = %envelope.chat_id,
                        "envelope already persisted, advancing"
                    );
                    return RecordDisposition::Commit;
                }
                Err(err) => {
                    attempts += 1;
                    if attempts >= self.settings.max_attempts {
                        error!(
                            error = %err,
                            conversation_id = %envelope.chat_id,
                            attempts,
                            "attempt budget exhausted, diverting to dead-letter topic"
                        );
                        return RecordDisposition::DeadLetter;
                    }

                    warn!(
                        error = %err,
                        conversation_id = %envelope.chat_id,
                        attempt = attempts,
                        resume_in = ?self.settings.resume_delay,
                        "persistence failed, pausing consumer"
                    );
                    if self.pause().await {
                        return RecordDisposition::Abandon;
                    }
                }
            }
        }
    }

    /// Enter PAUSED, wait out the resume delay, return to RUNNING.
    ///
    /// Returns `true` when shutdown was requested while paused; the pending
    /// resume timer is cancelled rather than awaited.
    async fn pause(&self) -> bool {
        self.mode.send_replace(ConsumerMode::Paused);

        let mut shutdown = self.shutdown.clone();
        let interrupted = tokio::select! {
            _ = tokio::time::sleep(self.settings.resume_delay) => false,
            // A closed channel means the process context is gone; treat it
            // like an explicit shutdown.
            result = shutdown.wait_for(|stop| *stop) => {
                let _ = result;
                true
            }
        };

        self.mode.send_replace(ConsumerMode::Running);
        if interrupted {
            info!("shutdown requested during backpressure pause");
        } else {
            info!("resume timer fired, consumer running again");
        }
        interrupted
    }
}
