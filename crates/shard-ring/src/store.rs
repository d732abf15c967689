//! Process-local routing store.
//!
//! Holds this node's view of:
//! - the last transmitted workflow → shard assignments
//! - shard health (as agreed by the most recent outcome)
//! - the sorted list of healthy shards, rebuilt on every health change
//! - the last transmitted routing state
//! - workflows waiting for their first assignment (pending allocations)
//!
//! One mutex guards everything, so health and routes are always observed
//! together. Every method holds the lock for its whole duration and returns
//! copies; callers never see internal references.
//!
//! Nothing here is persisted. After a restart the agreed topology is rebuilt
//! from the outcomes the OCR3 engine replays.

use crate::error::{Result, RingError};
use crate::types::{RoutingState, ShardId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::oneshot;
use tracing::debug;

/// Routing store shared by the plugin, the transmitter and workflow callers.
pub struct Store {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    /// workflow ID → shard
    routes: HashMap<String, ShardId>,

    /// shard → healthy
    shard_health: HashMap<ShardId, bool>,

    /// Sorted healthy shard IDs (derived from `shard_health`)
    healthy_shards: Vec<ShardId>,

    /// Last transmitted routing state
    routing_state: Option<RoutingState>,

    /// workflow ID → callers waiting for an assignment
    pending: BTreeMap<String, Vec<oneshot::Sender<ShardId>>>,

    closed: bool,
}

impl Inner {
    fn rebuild_healthy_shards(&mut self) {
        let mut healthy: Vec<ShardId> = self
            .shard_health
            .iter()
            .filter(|(_, healthy)| **healthy)
            .map(|(shard, _)| *shard)
            .collect();
        healthy.sort_unstable();
        self.healthy_shards = healthy;
    }

    fn in_transition(&self) -> bool {
        self.routing_state
            .as_ref()
            .is_some_and(RoutingState::is_transition)
    }

    /// Hand out assignments to every waiter whose workflow is now routed.
    fn fulfill_pending(&mut self) {
        let routes = &self.routes;
        let mut fulfilled = 0usize;
        self.pending.retain(|workflow_id, waiters| match routes.get(workflow_id) {
            Some(shard) => {
                for waiter in waiters.drain(..) {
                    // Receiver gone means the caller stopped waiting
                    let _ = waiter.send(*shard);
                }
                fulfilled += 1;
                false
            }
            None => true,
        });
        if fulfilled > 0 {
            debug!(fulfilled, pending = self.pending.len(), "fulfilled pending allocations");
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Copy of the workflow → shard assignments.
    pub fn routes(&self) -> HashMap<String, ShardId> {
        self.inner.lock().routes.clone()
    }

    /// Replace the workflow → shard assignments and wake any callers waiting
    /// for one of the newly routed workflows.
    pub fn set_routes(&self, routes: HashMap<String, ShardId>) {
        let mut inner = self.inner.lock();
        inner.routes = routes;
        inner.fulfill_pending();
    }

    /// Current shard of a workflow, if routed.
    pub fn shard_for_workflow(&self, workflow_id: &str) -> Option<ShardId> {
        self.inner.lock().routes.get(workflow_id).copied()
    }

    /// Shard of a workflow, waiting for the next agreed assignment if needed.
    ///
    /// Returns immediately when the workflow is routed and the ring is steady.
    /// Otherwise the workflow is queued as a pending allocation, reported in
    /// the next observations, and this call resolves once a transmitted
    /// outcome routes it. Drop the future (or wrap it in a timeout) to stop
    /// waiting.
    pub async fn get_shard_for_workflow(&self, workflow_id: &str) -> Result<ShardId> {
        let rx = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(RingError::StoreClosed);
            }
            if !inner.in_transition() {
                if let Some(shard) = inner.routes.get(workflow_id) {
                    return Ok(*shard);
                }
            }

            let (tx, rx) = oneshot::channel();
            inner
                .pending
                .entry(workflow_id.to_string())
                .or_default()
                .push(tx);
            rx
        };

        rx.await.map_err(|_| RingError::StoreClosed)
    }

    /// Sorted workflow IDs still waiting for an assignment, at most `limit`.
    ///
    /// Workflows whose callers all stopped waiting are dropped here.
    pub fn pending_allocations(&self, limit: usize) -> Vec<String> {
        let mut inner = self.inner.lock();
        inner.pending.retain(|_, waiters| {
            waiters.retain(|waiter| !waiter.is_closed());
            !waiters.is_empty()
        });
        inner.pending.keys().take(limit).cloned().collect()
    }

    /// Copy of the shard health map.
    pub fn shard_health(&self) -> HashMap<ShardId, bool> {
        self.inner.lock().shard_health.clone()
    }

    pub fn set_shard_health(&self, shard: ShardId, healthy: bool) {
        let mut inner = self.inner.lock();
        inner.shard_health.insert(shard, healthy);
        inner.rebuild_healthy_shards();
    }

    /// Replace the whole shard health map.
    pub fn set_all_shard_health(&self, health: HashMap<ShardId, bool>) {
        let mut inner = self.inner.lock();
        inner.shard_health = health;
        inner.rebuild_healthy_shards();
    }

    /// Sorted healthy shard IDs.
    pub fn healthy_shards(&self) -> Vec<ShardId> {
        self.inner.lock().healthy_shards.clone()
    }

    pub fn healthy_shard_count(&self) -> usize {
        self.inner.lock().healthy_shards.len()
    }

    /// Last transmitted routing state.
    pub fn routing_state(&self) -> Option<RoutingState> {
        self.inner.lock().routing_state
    }

    pub fn set_routing_state(&self, state: RoutingState) {
        self.inner.lock().routing_state = Some(state);
    }

    pub fn is_in_transition(&self) -> bool {
        self.inner.lock().in_transition()
    }

    /// Fail every pending caller and reject new waits.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.pending.clear();
    }
}
