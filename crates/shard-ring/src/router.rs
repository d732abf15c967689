//! Consistent-hash routing of workflows to shards.
//!
//! This module implements:
//! - xxhash64 with seed=0 for key hashing
//! - a consistent-hash ring with bounded loads over shard members
//!
//! CRITICAL: every node must build the exact same ring, so the hash and the
//! ring constants below are part of the consensus protocol. Changing any of
//! them splits routing agreement across nodes.
//!
//! # Ring construction
//!
//! ```text
//! members:    0 .. shard_count
//! vnodes:     xxhash64("{member}{replica}") for replica in 0..REPLICATION_FACTOR
//! partitions: for p in 0..PARTITION_COUNT
//!               start at first vnode >= xxhash64(p as u64 LE bytes), wrapping
//!               walk clockwise to the first member with load + 1 <= max_load
//! max_load:   ceil(floor(PARTITION_COUNT / members) * LOAD_FACTOR)
//! lookup:     partitions[xxhash64(key) % PARTITION_COUNT]
//! ```
//!
//! The average load is an integer division taken before the float multiply.
//! Vnode keys can collide ("1" + "11" and "11" + "1"); the vnode then belongs
//! to the higher member.

use crate::types::ShardId;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Number of partitions keys are bucketed into (prime, for smooth distribution).
pub const PARTITION_COUNT: u64 = 997;

/// Virtual nodes per member.
pub const REPLICATION_FACTOR: u32 = 50;

/// Maximum partitions per member relative to the average.
pub const LOAD_FACTOR: f64 = 1.1;

/// Compute xxhash64 of a key with seed=0.
///
/// # Examples
///
/// ```
/// use shard_ring::router::xxhash64;
///
/// let hash = xxhash64(b"hello");
/// assert_eq!(hash, xxhash64(b"hello")); // Deterministic
/// ```
pub fn xxhash64(key: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(key);
    hasher.finish()
}

/// Bounded-load consistent-hash ring over shards `0..member_count`.
#[derive(Debug, Clone)]
pub struct HashRing {
    member_count: u32,

    /// partition → owning shard
    partitions: Vec<ShardId>,
}

impl HashRing {
    /// Build the ring for `member_count` shards.
    ///
    /// An empty ring (zero members) routes every key to shard 0.
    pub fn new(member_count: u32) -> Self {
        if member_count == 0 {
            return Self {
                member_count,
                partitions: Vec::new(),
            };
        }

        let vnodes = Self::vnodes(member_count);
        let max_load = Self::max_load(member_count);
        let mut loads = vec![0u64; member_count as usize];
        let mut partitions = Vec::with_capacity(PARTITION_COUNT as usize);

        for partition in 0..PARTITION_COUNT {
            let key = xxhash64(&partition.to_le_bytes());
            let mut start = vnodes.partition_point(|(hash, _)| *hash < key);
            if start >= vnodes.len() {
                start = 0;
            }

            // Up to PARTITION_COUNT members, total capacity exceeds
            // PARTITION_COUNT and every member owns vnodes, so one lap
            // finds room.
            let owner = (0..vnodes.len())
                .map(|step| vnodes[(start + step) % vnodes.len()].1)
                .find(|member| loads[*member as usize] + 1 <= max_load)
                .unwrap_or(vnodes[start].1);

            loads[owner as usize] += 1;
            partitions.push(owner);
        }

        Self {
            member_count,
            partitions,
        }
    }

    /// Virtual nodes sorted by hash, one owner per hash.
    fn vnodes(member_count: u32) -> Vec<(u64, ShardId)> {
        let mut vnodes: Vec<(u64, ShardId)> =
            Vec::with_capacity((member_count * REPLICATION_FACTOR) as usize);
        for member in 0..member_count {
            for replica in 0..REPLICATION_FACTOR {
                let key = format!("{}{}", member, replica);
                vnodes.push((xxhash64(key.as_bytes()), member));
            }
        }
        // Higher member first within a hash, so dedup keeps it
        vnodes.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        vnodes.dedup_by_key(|(hash, _)| *hash);
        vnodes
    }

    /// Maximum partitions a single member may own.
    pub fn max_load(member_count: u32) -> u64 {
        if member_count == 0 {
            return 0;
        }
        let average = PARTITION_COUNT / u64::from(member_count);
        (average as f64 * LOAD_FACTOR).ceil() as u64
    }

    pub fn member_count(&self) -> u32 {
        self.member_count
    }

    /// Partition a key falls into.
    pub fn partition_for(key: &str) -> u64 {
        xxhash64(key.as_bytes()) % PARTITION_COUNT
    }

    /// Shard owning `key`.
    pub fn locate(&self, key: &str) -> ShardId {
        if self.partitions.is_empty() {
            return 0;
        }
        self.partitions[Self::partition_for(key) as usize]
    }

    /// Number of partitions owned by each member.
    pub fn loads(&self) -> Vec<u64> {
        let mut loads = vec![0u64; self.member_count as usize];
        for owner in &self.partitions {
            loads[*owner as usize] += 1;
        }
        loads
    }
}

/// Assign a workflow to one of `healthy_shard_count` shards.
///
/// Pure function of its inputs: every node, on every call, returns the same
/// shard for the same `(workflow_id, healthy_shard_count)`. Returns 0 when
/// there are no healthy shards.
///
/// # Examples
///
/// ```
/// use shard_ring::assign_shard;
///
/// let shard = assign_shard("wf-123", 4);
/// assert!(shard < 4);
/// assert_eq!(shard, assign_shard("wf-123", 4));
/// assert_eq!(assign_shard("wf-123", 0), 0);
/// ```
pub fn assign_shard(workflow_id: &str, healthy_shard_count: u32) -> ShardId {
    HashRing::new(healthy_shard_count).locate(workflow_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_xxhash64_consistency() {
        let key = b"hello";
        assert_eq!(xxhash64(key), xxhash64(key), "xxhash64 should be deterministic");
    }

    #[test]
    fn test_xxhash64_different_keys() {
        assert_ne!(xxhash64(b"hello"), xxhash64(b"world"));
    }

    #[test]
    fn test_xxhash64_known_vector() {
        // XXH64 of the empty input with seed 0
        assert_eq!(xxhash64(b""), 0xef46db3751d8e999);
    }

    #[test]
    fn test_max_load_known_values() {
        // floor(997 / m) * 1.1, rounded up
        assert_eq!(HashRing::max_load(1), 1097);
        assert_eq!(HashRing::max_load(2), 548);
        assert_eq!(HashRing::max_load(4), 274);
        assert_eq!(HashRing::max_load(5), 219);
        assert_eq!(HashRing::max_load(0), 0);
    }

    #[test]
    fn test_vnode_collision_goes_to_later_member() {
        // "1" + "11" and "11" + "1" hash to the same vnode
        let vnodes = HashRing::vnodes(12);
        let hash = xxhash64(b"111");
        let owners: Vec<_> = vnodes.iter().filter(|(h, _)| *h == hash).collect();
        assert_eq!(owners, vec![&(hash, 11)]);
        assert!(vnodes.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_zero_shards_routes_to_zero() {
        assert_eq!(assign_shard("wf-A", 0), 0);
        assert_eq!(HashRing::new(0).locate("anything"), 0);
    }

    #[test]
    fn test_single_shard_owns_everything() {
        let ring = HashRing::new(1);
        assert_eq!(ring.loads(), vec![PARTITION_COUNT]);
        for i in 0..100 {
            assert_eq!(ring.locate(&format!("wf-{}", i)), 0);
        }
    }

    #[test]
    fn test_assign_in_range() {
        for count in 1..=8 {
            for i in 0..200 {
                let shard = assign_shard(&format!("wf-{}", i), count);
                assert!(shard < count, "shard {} out of range for {}", shard, count);
            }
        }
    }

    #[test]
    fn test_assign_consistency() {
        let a = HashRing::new(5);
        let b = HashRing::new(5);
        for i in 0..500 {
            let key = format!("workflow-{}", i);
            assert_eq!(a.locate(&key), b.locate(&key));
            assert_eq!(a.locate(&key), assign_shard(&key, 5));
        }
    }

    #[test]
    fn test_loads_are_bounded() {
        for count in 1..=16 {
            let ring = HashRing::new(count);
            let loads = ring.loads();
            let max_load = HashRing::max_load(count);

            assert_eq!(loads.iter().sum::<u64>(), PARTITION_COUNT);
            for load in loads {
                assert!(load <= max_load, "load {} exceeds {}", load, max_load);
            }
        }
    }

    #[test]
    fn test_distribution_hits_all_shards() {
        let ring = HashRing::new(10);
        let mut shards = HashSet::new();
        for i in 0u64..1000 {
            shards.insert(ring.locate(&format!("wf-{}", i)));
        }
        assert_eq!(shards.len(), 10, "expected every shard to receive keys");
    }

    #[test]
    fn test_growing_ring_keeps_most_keys() {
        let old = HashRing::new(3);
        let new = HashRing::new(4);

        let moved = (0..1000)
            .map(|i| format!("wf-{}", i))
            .filter(|key| old.locate(key) != new.locate(key))
            .count();

        assert!(moved > 0, "a new shard must take over some keys");
        assert!(moved < 700, "too many keys moved: {}", moved);
    }
}
