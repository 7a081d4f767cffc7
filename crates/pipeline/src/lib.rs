//! Durable persistence pipeline.
//!
//! Confirmed envelopes are appended to an append-only log topic by the
//! [`LogProducer`]; one logical worker per consumer group drains the topic
//! into the relational store. The worker owns the only piece of long-lived
//! mutable state in the system, the [`ConsumerMode`] machine:
//!
//! ```text
//! RUNNING --(transaction failure)--> PAUSED
//! PAUSED  --(resume timer fires)---> RUNNING
//! ```
//!
//! Offsets are committed only after a successful transaction, a duplicate
//! hit, a malformed-payload skip, or a dead-letter diversion. A failing
//! record is retried in place across pause cycles and can never be silently
//! skipped; after the attempt budget it is diverted to the dead-letter topic.

pub mod client;
pub mod consumer;
pub mod error;
pub mod key;
pub mod producer;
pub mod state;
pub mod store;
pub mod worker;

pub use consumer::PersistenceConsumer;
pub use error::PipelineError;
pub use key::RecordKeyGen;
pub use producer::LogProducer;
pub use state::ConsumerMode;
pub use store::EnvelopeStore;
pub use worker::{PersistenceWorker, RecordDisposition, WorkerSettings};
