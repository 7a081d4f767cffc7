//! The consumer's observable state machine.

use std::fmt;

/// Mode of the persistence consumer. Process-wide, lives for the process
/// lifetime, mutated only by the worker's own failure/timer logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerMode {
    /// Pulling and persisting records.
    Running,
    /// Stopped pulling after a persistence failure; a resume timer is
    /// pending. Already-delivered real-time messages are unaffected.
    Paused,
}

impl fmt::Display for ConsumerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsumerMode::Running => write!(f, "running"),
            ConsumerMode::Paused => write!(f, "paused"),
        }
    }
}
