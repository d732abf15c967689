//! ArbiterScaler abstraction.
//!
//! The arbiter owns the actual shard fleet and scales it to the count the
//! network agreed on. Implementations:
//! - gRPC client for production (ring-transport-grpc crate)
//! - recording in-memory arbiter for tests (ring-testkit crate)
//!
//! Calls are at-most-once from the ring's point of view: no retries are made
//! here, a transport that wants retries implements them itself.

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ArbiterScaler: Send + Sync {
    /// Tell the arbiter how many shards the network wants.
    ///
    /// Errors:
    /// - `Arbiter`: RPC failed, timed out or was rejected
    async fn consensus_want_shards(&self, n_shards: u32) -> Result<()>;
}
