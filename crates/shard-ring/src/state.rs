//! Routing state machine.
//!
//! ```text
//!            want != shards                      now >= changes_safe_after
//! Steady(n) ───────────────▶ Transition(n → w) ─────────────────────────▶ Steady(w)
//!   │  ▲        id + 1          │  ▲                     id + 1
//!   └──┘                        └──┘
//! want == shards            now < changes_safe_after
//! (unchanged)               (unchanged)
//! ```
//!
//! The safety period lets every node observe the new shard count before any
//! node completes the transition. `now` is the median of the round's
//! observation timestamps, so all honest nodes evaluate the gate identically.

use crate::error::{Result, RingError};
use crate::types::{RoutingState, ShardState, Transition};
use std::time::{Duration, SystemTime};

/// True if `state` is present and steady.
pub fn is_steady(state: Option<&RoutingState>) -> bool {
    state.is_some_and(RoutingState::is_steady)
}

/// True if `state` is present and mid-transition.
pub fn is_transition(state: Option<&RoutingState>) -> bool {
    state.is_some_and(RoutingState::is_transition)
}

/// Compute the next routing state.
///
/// Errors:
/// - `NilState`: there is no current state
/// - `Config`: `now + time_to_sync` is not a representable time
pub fn next_state(
    current: Option<&RoutingState>,
    want_shards: u32,
    now: SystemTime,
    time_to_sync: Duration,
) -> Result<RoutingState> {
    let current = current.ok_or(RingError::NilState)?;

    match current.state {
        ShardState::RoutableShards(shards) if shards == want_shards => Ok(*current),
        ShardState::RoutableShards(shards) => {
            let changes_safe_after = now.checked_add(time_to_sync).ok_or_else(|| {
                RingError::Config {
                    reason: format!("time_to_sync {:?} overflows the clock", time_to_sync),
                }
            })?;
            Ok(RoutingState::transition(
                current.id + 1,
                Transition {
                    want_shards,
                    last_stable_count: shards,
                    changes_safe_after,
                },
            ))
        }
        ShardState::Transition(transition) if now < transition.changes_safe_after => {
            Ok(*current)
        }
        ShardState::Transition(transition) => Ok(RoutingState::steady(
            current.id + 1,
            transition.want_shards,
        )),
    }
}
