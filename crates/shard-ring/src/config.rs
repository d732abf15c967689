//! Consensus configuration (shard bounds, batching, safety period).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lower bound on the routable shard count.
pub const DEFAULT_MIN_SHARD_COUNT: u32 = 1;

/// Default number of pending allocations carried per observation.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default safety period before a shard-count transition completes.
pub const DEFAULT_TIME_TO_SYNC: Duration = Duration::from_secs(5 * 60);

/// Longest accepted safety period.
pub const MAX_TIME_TO_SYNC: Duration = Duration::from_secs(24 * 60 * 60);

/// Ring consensus configuration.
///
/// Zero values mean "unset" and are replaced with defaults by [`normalized`],
/// except `max_shard_count`, which has no default and must be set.
///
/// Example YAML (embedded in host configuration):
/// ```yaml
/// min_shard_count: 1
/// max_shard_count: 16
/// batch_size: 100
/// time_to_sync:
///   secs: 300
///   nanos: 0
/// ```
///
/// [`normalized`]: ConsensusConfig::normalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Lower bound on the routable shard count.
    ///
    /// Default: 1
    pub min_shard_count: u32,

    /// Upper bound on the routable shard count. Required (> 0).
    pub max_shard_count: u32,

    /// Maximum pending allocations reported in one observation.
    ///
    /// Default: 100
    pub batch_size: usize,

    /// Time all nodes are given to observe a new shard count before
    /// workflows are moved.
    ///
    /// Default: 5 minutes, at most 24 hours
    pub time_to_sync: Duration,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            min_shard_count: DEFAULT_MIN_SHARD_COUNT,
            max_shard_count: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            time_to_sync: DEFAULT_TIME_TO_SYNC,
        }
    }
}

impl ConsensusConfig {
    /// Config with the given upper bound and defaults elsewhere.
    pub fn new(max_shard_count: u32) -> Self {
        Self {
            max_shard_count,
            ..Self::default()
        }
    }

    pub fn with_min_shard_count(mut self, min: u32) -> Self {
        self.min_shard_count = min;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_time_to_sync(mut self, time_to_sync: Duration) -> Self {
        self.time_to_sync = time_to_sync;
        self
    }

    /// Replace unset (zero) values with defaults.
    pub fn normalized(mut self) -> Self {
        if self.min_shard_count == 0 {
            self.min_shard_count = DEFAULT_MIN_SHARD_COUNT;
        }
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        if self.time_to_sync.is_zero() {
            self.time_to_sync = DEFAULT_TIME_TO_SYNC;
        }
        self
    }

    /// Validate configuration (after normalization).
    pub fn validate(&self) -> Result<(), String> {
        if self.max_shard_count == 0 {
            return Err("max_shard_count must be > 0".to_string());
        }

        if self.min_shard_count > self.max_shard_count {
            return Err(format!(
                "min_shard_count ({}) must be <= max_shard_count ({})",
                self.min_shard_count, self.max_shard_count
            ));
        }

        if self.time_to_sync > MAX_TIME_TO_SYNC {
            return Err(format!(
                "time_to_sync ({:?}) must be <= {:?}",
                self.time_to_sync, MAX_TIME_TO_SYNC
            ));
        }

        Ok(())
    }

    /// Clamp a desired shard count into `[min_shard_count, max_shard_count]`.
    pub fn clamp_shards(&self, want: u32) -> u32 {
        want.max(self.min_shard_count).min(self.max_shard_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsensusConfig::new(8);
        assert_eq!(config.min_shard_count, 1);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.time_to_sync, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_requires_max_shard_count() {
        let config = ConsensusConfig::default().normalized();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalized_fills_zero_values() {
        let config = ConsensusConfig {
            min_shard_count: 0,
            max_shard_count: 4,
            batch_size: 0,
            time_to_sync: Duration::ZERO,
        }
        .normalized();

        assert_eq!(config, ConsensusConfig::new(4));
    }

    #[test]
    fn test_normalized_keeps_explicit_values() {
        let config = ConsensusConfig::new(4)
            .with_min_shard_count(2)
            .with_batch_size(7)
            .with_time_to_sync(Duration::from_secs(30))
            .normalized();

        assert_eq!(config.min_shard_count, 2);
        assert_eq!(config.batch_size, 7);
        assert_eq!(config.time_to_sync, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_min_above_max() {
        let config = ConsensusConfig::new(2).with_min_shard_count(3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_time_to_sync_above_max() {
        let config = ConsensusConfig::new(4)
            .with_time_to_sync(Duration::MAX)
            .normalized();
        assert!(config.validate().is_err());

        let config = ConsensusConfig::new(4).with_time_to_sync(MAX_TIME_TO_SYNC);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_clamp_shards() {
        let config = ConsensusConfig::new(4).with_min_shard_count(2);
        assert_eq!(config.clamp_shards(0), 2);
        assert_eq!(config.clamp_shards(3), 3);
        assert_eq!(config.clamp_shards(9), 4);
    }
}
