//! Property-based test generators.
//!
//! Provides proptest strategies for:
//! - routing states (steady and mid-transition)
//! - workflow IDs and batches of them

use proptest::collection::vec;
use proptest::prelude::*;
use shard_ring::{RoutingState, Transition};
use std::time::{Duration, SystemTime};

use crate::clock::epoch;

/// Shard counts in the range a real deployment uses.
pub fn shard_count() -> impl Strategy<Value = u32> {
    1u32..=32
}

/// Instants within a day of [`epoch`].
pub fn instant() -> impl Strategy<Value = SystemTime> {
    (0u64..86_400).prop_map(|secs| epoch() + Duration::from_secs(secs))
}

/// Workflow IDs in the shape the engine assigns them.
pub fn workflow_id() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,16}".prop_map(|suffix| format!("wf-{suffix}"))
}

/// Up to `max` workflow IDs, possibly with duplicates.
pub fn workflow_ids(max: usize) -> impl Strategy<Value = Vec<String>> {
    vec(workflow_id(), 0..=max)
}

pub fn steady_state() -> impl Strategy<Value = RoutingState> {
    (0u64..1_000, shard_count()).prop_map(|(id, shards)| RoutingState::steady(id, shards))
}

pub fn transition_state() -> impl Strategy<Value = RoutingState> {
    (0u64..1_000, shard_count(), shard_count(), instant()).prop_map(
        |(id, want_shards, last_stable_count, changes_safe_after)| {
            RoutingState::transition(
                id,
                Transition {
                    want_shards,
                    last_stable_count,
                    changes_safe_after,
                },
            )
        },
    )
}

/// Any routing state.
pub fn routing_state() -> impl Strategy<Value = RoutingState> {
    prop_oneof![steady_state(), transition_state()]
}
