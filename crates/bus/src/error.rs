//! Error types for the fan-out bus.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    /// The channel connection was down at call time. The operation is
    /// dropped, not buffered.
    #[error("fan-out bus unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),

    #[error("fan-out frame codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
