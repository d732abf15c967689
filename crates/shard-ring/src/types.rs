//! Consensus payloads: routing state, observations and outcomes.
//!
//! Observations and outcomes cross the OCR3 boundary as bytes and must encode
//! identically on every node. They use bincode over serde with `BTreeMap` and
//! sorted `Vec`s so that equal values always produce equal bytes.

use crate::error::{Result, RingError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

/// Shard identifier (0..shard_count).
pub type ShardId = u32;

/// Agreed routing state, carried in every outcome.
///
/// `id` increments exactly when the state switches between steady and
/// transition, and never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingState {
    pub id: u64,
    pub state: ShardState,
}

/// Exactly one of steady or mid-transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShardState {
    /// Steady: this many shards are routable.
    RoutableShards(u32),

    /// Moving from `last_stable_count` to `want_shards` shards.
    Transition(Transition),
}

/// Mid-flight shard-count change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Target shard count
    pub want_shards: u32,

    /// Shard count being left behind
    pub last_stable_count: u32,

    /// Earliest time at which completing the transition is safe
    pub changes_safe_after: SystemTime,
}

impl RoutingState {
    pub fn steady(id: u64, shards: u32) -> Self {
        Self {
            id,
            state: ShardState::RoutableShards(shards),
        }
    }

    pub fn transition(id: u64, transition: Transition) -> Self {
        Self {
            id,
            state: ShardState::Transition(transition),
        }
    }

    pub fn is_steady(&self) -> bool {
        matches!(self.state, ShardState::RoutableShards(_))
    }

    pub fn is_transition(&self) -> bool {
        matches!(self.state, ShardState::Transition(_))
    }

    /// Shard count in steady state, `None` mid-transition.
    pub fn routable_shards(&self) -> Option<u32> {
        match self.state {
            ShardState::RoutableShards(n) => Some(n),
            ShardState::Transition(_) => None,
        }
    }

    /// Shard count the network is heading to: the routable count when
    /// steady, the target count mid-transition.
    pub fn target_shards(&self) -> u32 {
        match self.state {
            ShardState::RoutableShards(n) => n,
            ShardState::Transition(t) => t.want_shards,
        }
    }
}

impl fmt::Display for RoutingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            ShardState::RoutableShards(n) => write!(f, "#{} steady({})", self.id, n),
            ShardState::Transition(t) => write!(
                f,
                "#{} transition({} -> {})",
                self.id, t.last_stable_count, t.want_shards
            ),
        }
    }
}

/// Route of a single workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRoute {
    pub shard: ShardId,
}

/// Per-round agreed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub state: RoutingState,

    /// workflow ID → route
    pub routes: BTreeMap<String, WorkflowRoute>,

    /// Shards agreed healthy in this round (sorted)
    pub healthy_shards: Vec<ShardId>,
}

impl Outcome {
    pub fn encode(&self) -> Result<Bytes> {
        bincode::serialize(self)
            .map(Bytes::from)
            .map_err(|source| RingError::Encode {
                what: "outcome",
                source,
            })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|source| RingError::Decode {
            what: "outcome",
            source,
        })
    }

    /// Decode the previous round's outcome; empty bytes mean the first round.
    pub fn decode_previous(bytes: &[u8]) -> Result<Option<Self>> {
        if bytes.is_empty() {
            return Ok(None);
        }
        Self::decode(bytes).map(Some)
    }

    /// Routes as a plain workflow → shard map.
    pub fn shard_assignments(&self) -> std::collections::HashMap<String, ShardId> {
        self.routes
            .iter()
            .map(|(id, route)| (id.clone(), route.shard))
            .collect()
    }
}

/// Per-node input to a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// shard → healthy
    pub shard_health_status: BTreeMap<ShardId, bool>,

    /// Sorted, deduplicated IDs of routed and pending workflows
    pub workflow_ids: Vec<String>,

    /// Observer's wall-clock time
    pub now: SystemTime,
}

impl Observation {
    pub fn encode(&self) -> Result<Bytes> {
        bincode::serialize(self)
            .map(Bytes::from)
            .map_err(|source| RingError::Encode {
                what: "observation",
                source,
            })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|source| RingError::Decode {
            what: "observation",
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_state_exclusivity() {
        let steady = RoutingState::steady(1, 3);
        assert!(steady.is_steady());
        assert!(!steady.is_transition());
        assert_eq!(steady.routable_shards(), Some(3));

        let transition = RoutingState::transition(
            2,
            Transition {
                want_shards: 4,
                last_stable_count: 3,
                changes_safe_after: at(100),
            },
        );
        assert!(!transition.is_steady());
        assert!(transition.is_transition());
        assert_eq!(transition.routable_shards(), None);
        assert_eq!(transition.target_shards(), 4);
    }

    #[test]
    fn test_outcome_encoding_is_deterministic() {
        let mut a = Outcome {
            state: RoutingState::steady(3, 2),
            routes: BTreeMap::new(),
            healthy_shards: vec![0, 1],
        };
        let mut b = a.clone();

        // Same entries, different insertion order
        a.routes.insert("wf-b".into(), WorkflowRoute { shard: 1 });
        a.routes.insert("wf-a".into(), WorkflowRoute { shard: 0 });
        b.routes.insert("wf-a".into(), WorkflowRoute { shard: 0 });
        b.routes.insert("wf-b".into(), WorkflowRoute { shard: 1 });

        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
        assert_eq!(Outcome::decode(&a.encode().unwrap()).unwrap(), b);
    }

    #[test]
    fn test_decode_previous_empty_is_first_round() {
        assert!(Outcome::decode_previous(&[]).unwrap().is_none());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = Outcome::decode(&[0xff, 0x01]).unwrap_err();
        assert!(matches!(err, RingError::Decode { what: "outcome", .. }));

        let err = Observation::decode(&[0x01]).unwrap_err();
        assert!(matches!(err, RingError::Decode { what: "observation", .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(RoutingState::steady(4, 2).to_string(), "#4 steady(2)");
        let t = RoutingState::transition(
            5,
            Transition {
                want_shards: 3,
                last_stable_count: 2,
                changes_safe_after: at(0),
            },
        );
        assert_eq!(t.to_string(), "#5 transition(2 -> 3)");
    }
}
