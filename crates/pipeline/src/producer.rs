//! Producing side of the durable log.

use std::time::Duration;

use parlor_config::KafkaConfig;
use parlor_messages::Envelope;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{debug, error, info};

use crate::client::create_client_config;
use crate::error::PipelineError;
use crate::key::RecordKeyGen;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Appends envelopes to the durable log topic.
///
/// Constructed once at startup and reused for the process lifetime; clones
/// share the underlying client.
pub struct LogProducer {
    producer: FutureProducer,
    topic: String,
    keys: RecordKeyGen,
}

impl LogProducer {
    pub fn new(config: &KafkaConfig) -> Result<Self, PipelineError> {
        let producer: FutureProducer = create_client_config(config)
            .set("message.timeout.ms", "5000")
            .create()?;

        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            "durable log producer initialized"
        );

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            keys: RecordKeyGen::new(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Append one envelope to the log.
    ///
    /// The record value is the envelope's JSON serialization; the key is
    /// unique per producer and submission. When the broker is unreachable
    /// the record is dropped and the error returned for the caller to log —
    /// there is no local retry queue.
    pub async fn enqueue(&self, envelope: &Envelope) -> Result<(), PipelineError> {
        let payload = envelope.to_json()?;
        let key = self.keys.next();

        let record = FutureRecord::to(&self.topic)
            .key(key.as_bytes())
            .payload(payload.as_slice());

        match self.producer.send(record, Timeout::After(SEND_TIMEOUT)).await {
            Ok((partition, offset)) => {
                debug!(
                    partition,
                    offset,
                    key = %key,
                    conversation_id = %envelope.chat_id,
                    "envelope appended to durable log"
                );
                Ok(())
            }
            Err((err, _)) => {
                error!(
                    error = %err,
                    topic = %self.topic,
                    conversation_id = %envelope.chat_id,
                    "failed to append envelope to durable log"
                );
                Err(PipelineError::Transport(err.to_string()))
            }
        }
    }

    /// Wait for in-flight records during shutdown.
    pub fn flush(&self, timeout: Duration) -> Result<(), PipelineError> {
        self.producer.flush(Timeout::After(timeout))?;
        Ok(())
    }
}
