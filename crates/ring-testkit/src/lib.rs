//! Test harness for the shard-ring plugin.
//!
//! - [`ManualClock`]: a clock that only moves when told to
//! - [`RecordingArbiter`]: an arbiter that records every call and can fail on demand
//! - [`RingCluster`]: N oracles, each with its own store, plugin and
//!   transmitter, driven through complete OCR3 rounds in-process
//! - [`generators`]: proptest strategies for routing states and workflow IDs
//!
//! # Usage
//!
//! ```ignore
//! use ring_testkit::*;
//!
//! let mut cluster = RingCluster::new(4, 1, ConsensusConfig::new(8), epoch()).await?;
//! cluster.set_shard_health_everywhere(0, true);
//! let outcome = cluster.run_round().await?;
//! assert!(outcome.state.is_steady());
//! ```

pub mod arbiter;
pub mod clock;
pub mod cluster;
pub mod generators;

pub use arbiter::RecordingArbiter;
pub use clock::{epoch, ManualClock};
pub use cluster::{ClusterError, RingCluster, RingNode};

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}
