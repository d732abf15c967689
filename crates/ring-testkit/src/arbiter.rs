//! In-memory arbiter.

use async_trait::async_trait;
use parking_lot::Mutex;
use shard_ring::{ArbiterScaler, Result, RingError};
use std::sync::atomic::{AtomicBool, Ordering};

/// Arbiter that records every requested shard count.
///
/// Calls are recorded even when the arbiter is set to fail.
#[derive(Debug, Default)]
pub struct RecordingArbiter {
    calls: Mutex<Vec<u32>>,
    failing: AtomicBool,
}

impl RecordingArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every shard count received, oldest first.
    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<u32> {
        self.calls.lock().last().copied()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl ArbiterScaler for RecordingArbiter {
    async fn consensus_want_shards(&self, n_shards: u32) -> Result<()> {
        self.calls.lock().push(n_shards);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RingError::Arbiter {
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}
