//! Consuming side of the durable log.

use std::time::Duration;

use parlor_config::KafkaConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::BorrowedMessage;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use rdkafka::Message;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::client::create_client_config;
use crate::error::PipelineError;
use crate::state::ConsumerMode;
use crate::store::EnvelopeStore;
use crate::worker::{PersistenceWorker, RecordDisposition, WorkerSettings};

const RECV_ERROR_DELAY: Duration = Duration::from_secs(1);
const DLQ_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// One logical worker draining the log topic into the store.
///
/// Offsets are committed manually and only after the worker reaches a final
/// disposition for the record; a cold start replays the backlog from the
/// earliest retained record.
pub struct PersistenceConsumer<S> {
    consumer: StreamConsumer,
    dead_letters: FutureProducer,
    dead_letter_topic: String,
    topic: String,
    group: String,
    worker: PersistenceWorker<S>,
    shutdown: watch::Receiver<bool>,
}

impl<S: EnvelopeStore> PersistenceConsumer<S> {
    pub fn new(
        config: &KafkaConfig,
        store: S,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, PipelineError> {
        let consumer: StreamConsumer = create_client_config(config)
            .set("group.id", &config.group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()?;

        consumer.subscribe(&[&config.topic])?;

        let dead_letters: FutureProducer = create_client_config(config)
            .set("message.timeout.ms", "5000")
            .create()?;

        let worker = PersistenceWorker::new(
            store,
            WorkerSettings::from_config(config),
            shutdown.clone(),
        );

        Ok(Self {
            consumer,
            dead_letters,
            dead_letter_topic: config.dead_letter_topic(),
            topic: config.topic.clone(),
            group: config.group.clone(),
            worker,
            shutdown,
        })
    }

    /// Observe the worker's RUNNING/PAUSED mode.
    pub fn mode(&self) -> watch::Receiver<ConsumerMode> {
        self.worker.mode()
    }

    /// Consume until shutdown. Records are processed strictly one at a time;
    /// throughput is bounded by transaction latency by design.
    pub async fn run(self) -> Result<(), PipelineError> {
        info!(
            topic = %self.topic,
            group = %self.group,
            "persistence consumer started"
        );

        let mut shutdown = self.shutdown.clone();
        loop {
            let message = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                result = self.consumer.recv() => match result {
                    Ok(message) => message,
                    Err(err) => {
                        error!(error = %err, "error receiving from durable log");
                        tokio::time::sleep(RECV_ERROR_DELAY).await;
                        continue;
                    }
                },
            };

            // Detach the payload: the record may outlive several pause
            // cycles while the worker retries it.
            let payload = message.payload().map(<[u8]>::to_vec);

            match self.worker.process_record(payload.as_deref()).await {
                RecordDisposition::Commit => self.commit(&message),
                RecordDisposition::DeadLetter => {
                    let key = message.key().unwrap_or_default().to_vec();
                    match self.divert(&key, payload.as_deref().unwrap_or_default()).await {
                        Ok(()) => self.commit(&message),
                        Err(err) => {
                            // Offset stays uncommitted: a restart replays the
                            // record instead of losing it.
                            error!(
                                error = %err,
                                topic = %self.dead_letter_topic,
                                "failed to divert record, offset left uncommitted"
                            );
                        }
                    }
                }
                RecordDisposition::Abandon => break,
            }
        }

        info!("persistence consumer stopped");
        Ok(())
    }

    fn commit(&self, message: &BorrowedMessage<'_>) {
        if let Err(err) = self.consumer.commit_message(message, CommitMode::Async) {
            warn!(error = %err, "failed to commit consumer offset");
        }
    }

    async fn divert(&self, key: &[u8], payload: &[u8]) -> Result<(), PipelineError> {
        let record = FutureRecord::to(&self.dead_letter_topic)
            .key(key)
            .payload(payload);

        match self
            .dead_letters
            .send(record, Timeout::After(DLQ_SEND_TIMEOUT))
            .await
        {
            Ok((partition, offset)) => {
                warn!(
                    topic = %self.dead_letter_topic,
                    partition,
                    offset,
                    "record diverted to dead-letter topic"
                );
                Ok(())
            }
            Err((err, _)) => Err(PipelineError::Transport(err.to_string())),
        }
    }
}
