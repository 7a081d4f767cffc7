//! Fan-out bus adapter.
//!
//! Every gateway instance publishes confirmed client messages to one shared
//! Redis pub/sub channel and subscribes to that same channel exactly once at
//! process start. The subscriber callback is the only place real-time
//! delivery and durable enqueueing meet: each received frame is first
//! delivered to the instance's local sessions and then handed to the log
//! producer, strictly one frame at a time.
//!
//! The bus offers no buffering: a publish against a broken connection is
//! dropped with a warning. That makes the bus hop at-most-once; durability is
//! the log's job, not the bus's.

pub mod error;
pub mod frame;
pub mod publisher;
pub mod subscriber;

pub use error::BusError;
pub use frame::BusFrame;
pub use publisher::FanOutBus;
pub use subscriber::{run_subscriber, FrameHandler};
