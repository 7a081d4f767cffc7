//! Shared message model for the Parlor backend.
//!
//! The [`Envelope`] is the unit of exchange between every layer: the WebSocket
//! gateway accepts it from clients, the fan-out bus replicates it across
//! instances, the durable log stores its JSON serialization, and the
//! persistence consumer writes it to the database. It is immutable once
//! published; timestamps are assigned by the originating layer and never
//! regenerated downstream.

pub mod envelope;

pub use envelope::{Envelope, Sender};

/// Returns `true` when `room` is a usable room identifier.
///
/// Rooms are conversation ids; an empty or whitespace-only string is never a
/// valid target and must be rejected before it reaches the bus.
pub fn is_valid_room(room: &str) -> bool {
    !room.trim().is_empty()
}
