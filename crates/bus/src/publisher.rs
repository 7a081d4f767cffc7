//! Publishing side of the fan-out bus.

use parlor_messages::Envelope;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use crate::error::BusError;
use crate::frame::BusFrame;

/// Handle for publishing envelopes to the shared channel.
///
/// Wraps the process-wide [`ConnectionManager`]; clones share the underlying
/// connection and are cheap to hand to every session task.
#[derive(Clone)]
pub struct FanOutBus {
    conn: ConnectionManager,
    channel: String,
}

impl FanOutBus {
    pub fn new(conn: ConnectionManager, channel: impl Into<String>) -> Self {
        Self {
            conn,
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Serialize `{room, envelope}` and send it on the shared channel.
    ///
    /// There is no retry queue: when the connection is down the frame is
    /// lost on this hop and the error is the caller's to log.
    pub async fn publish(&self, room: &str, envelope: &Envelope) -> Result<(), BusError> {
        let payload = BusFrame::new(room, envelope.clone()).encode()?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn.publish(&self.channel, payload).await?;

        debug!(
            room = %room,
            channel = %self.channel,
            receivers,
            "published envelope to fan-out bus"
        );
        Ok(())
    }
}
