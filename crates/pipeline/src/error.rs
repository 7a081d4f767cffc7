//! Error types for the persistence pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A log record's payload does not deserialize into an envelope.
    /// Logged and skipped; parse failures are not transient and must not
    /// induce backpressure.
    #[error("malformed log payload: {0}")]
    MalformedPayload(String),

    /// The broker was unreachable at call time; the operation is dropped.
    #[error("durable log unavailable: {0}")]
    Transport(String),

    #[error("kafka client error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("envelope codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
