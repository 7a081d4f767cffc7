//! Record key generation.
//!
//! Log record keys must be unique under concurrent producers, so the
//! submission-timestamp scheme is replaced by a per-producer node id plus a
//! process-monotonic counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Generates `"<node>-<counter>"` record keys.
pub struct RecordKeyGen {
    node: String,
    counter: AtomicU64,
}

impl RecordKeyGen {
    pub fn new() -> Self {
        Self {
            node: cuid2::create_id(),
            counter: AtomicU64::new(0),
        }
    }

    /// Node component shared by every key this producer emits.
    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn next(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.node, seq)
    }
}

impl Default for RecordKeyGen {
    fn default() -> Self {
        Self::new()
    }
}
