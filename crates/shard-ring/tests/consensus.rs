//! End-to-end rounds across a committee of oracles.

use ocr3_plugin::{AttributedObservation, OracleId, OutcomeContext, ReportingPlugin};
use ring_testkit::{epoch, init_tracing, ClusterError, RingCluster};
use shard_ring::{
    assign_shard, ConsensusConfig, Observation, Outcome, RingError, RoutingState, ShardState,
    Transition,
};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

const N: usize = 4;
const F: usize = 1;

async fn cluster() -> RingCluster {
    init_tracing();
    RingCluster::new(N, F, ConsensusConfig::new(8), epoch())
        .await
        .unwrap()
}

#[tokio::test]
async fn routes_pending_workflows_onto_healthy_shards() {
    let mut cluster = cluster().await;
    for shard in 0..3 {
        cluster.set_shard_health_everywhere(shard, true);
    }
    // A single vote is not enough to mark shard 3 either way
    cluster.set_shard_health(3, 3, false);
    cluster
        .set_previous_outcome(&Outcome {
            state: RoutingState::steady(4, 3),
            routes: BTreeMap::new(),
            healthy_shards: vec![0, 1, 2],
        })
        .unwrap();

    let store = cluster.node(1).store().clone();
    let waiters: Vec<_> = ["wf-A", "wf-B", "wf-C", "wf-D"]
        .into_iter()
        .map(|id| {
            let store = store.clone();
            tokio::spawn(async move { (id, store.get_shard_for_workflow(id).await) })
        })
        .collect();
    while store.pending_allocations(10).len() < 4 {
        tokio::task::yield_now().await;
    }

    let outcome = cluster.run_round().await.unwrap();

    assert_eq!(outcome.state, RoutingState::steady(4, 3));
    assert_eq!(outcome.healthy_shards, vec![0, 1, 2]);
    assert_eq!(outcome.routes.len(), 4);
    for (id, route) in &outcome.routes {
        assert!(route.shard < 3);
        assert_eq!(route.shard, assign_shard(id, 3));
    }

    for waiter in waiters {
        let (id, shard) = waiter.await.unwrap();
        assert_eq!(shard.unwrap(), outcome.routes[id].shard);
    }

    // Every oracle applied the same routes
    for node in cluster.nodes() {
        assert_eq!(node.store().routes(), outcome.shard_assignments());
        assert_eq!(node.store().healthy_shards(), vec![0, 1, 2]);
    }
    assert_eq!(cluster.arbiter().calls(), vec![3; N]);
}

#[tokio::test]
async fn outcome_is_byte_identical_for_identical_input() {
    let cluster = cluster().await;
    let health: BTreeMap<u32, bool> = [(0, true), (1, true), (2, true)].into();
    let aos: Vec<_> = (0..N)
        .map(|i| {
            let observation = Observation {
                shard_health_status: health.clone(),
                workflow_ids: vec!["wf-A".into(), "wf-B".into(), "wf-C".into(), "wf-D".into()],
                now: epoch() + Duration::from_secs(i as u64),
            };
            AttributedObservation::new(OracleId(i as u8), observation.encode().unwrap())
        })
        .collect();
    let outctx = OutcomeContext {
        seq_nr: 1,
        ..Default::default()
    };

    let plugin = &cluster.node(0).plugin;
    let first = plugin.outcome(&outctx, &[], &aos).await.unwrap();
    let second = plugin.outcome(&outctx, &[], &aos).await.unwrap();
    assert_eq!(first, second);

    let other = cluster.node(2).plugin.outcome(&outctx, &[], &aos).await.unwrap();
    assert_eq!(first, other);
}

#[tokio::test]
async fn scale_up_waits_for_the_safety_period() {
    let mut cluster = cluster().await;
    cluster.set_shard_health_everywhere(0, true);
    cluster.set_shard_health_everywhere(1, true);

    // Steady(1) with two healthy shards starts a transition
    let outcome = cluster.run_round().await.unwrap();
    let expected = RoutingState::transition(
        1,
        Transition {
            want_shards: 2,
            last_stable_count: 1,
            changes_safe_after: epoch() + Duration::from_secs(300),
        },
    );
    assert_eq!(outcome.state, expected);
    assert!(cluster.nodes().iter().all(|n| n.store().is_in_transition()));
    assert_eq!(cluster.arbiter().last_call(), Some(2));

    // Before the gate nothing changes
    cluster.advance(Duration::from_secs(100));
    let outcome = cluster.run_round().await.unwrap();
    assert_eq!(outcome.state, expected);

    // At the gate the transition completes
    cluster.advance(Duration::from_secs(200));
    let outcome = cluster.run_round().await.unwrap();
    assert_eq!(outcome.state, RoutingState::steady(2, 2));
    assert!(cluster.nodes().iter().all(|n| !n.store().is_in_transition()));
}

#[tokio::test]
async fn lookups_wait_while_in_transition() {
    let mut cluster = cluster().await;
    cluster.set_shard_health_everywhere(0, true);
    cluster.set_shard_health_everywhere(1, true);
    cluster.run_round().await.unwrap();

    let store = cluster.node(0).store().clone();
    let waiter = {
        let store = store.clone();
        tokio::spawn(async move { store.get_shard_for_workflow("wf-late").await })
    };
    while store.pending_allocations(10).is_empty() {
        tokio::task::yield_now().await;
    }

    let outcome = cluster.run_round().await.unwrap();
    assert!(outcome.state.is_transition());
    assert_eq!(waiter.await.unwrap().unwrap(), outcome.routes["wf-late"].shard);
}

#[tokio::test]
async fn shard_expires_only_on_unhealthy_majority() {
    let mut cluster = cluster().await;
    cluster
        .set_previous_outcome(&Outcome {
            state: RoutingState::steady(2, 2),
            routes: BTreeMap::new(),
            healthy_shards: vec![0, 1],
        })
        .unwrap();
    cluster.set_shard_health_everywhere(0, true);
    cluster.set_shard_health_everywhere(1, true);

    // One unhealthy vote: ignored
    cluster.set_shard_health(0, 1, false);
    let outcome = cluster.run_round().await.unwrap();
    assert_eq!(outcome.state, RoutingState::steady(2, 2));
    assert_eq!(outcome.healthy_shards, vec![0, 1]);

    // Three unhealthy votes against one healthy: shard 1 expires and the
    // ring shrinks
    for oracle in 0..3 {
        cluster.set_shard_health(oracle, 1, false);
    }
    let outcome = cluster.run_round().await.unwrap();
    assert_eq!(outcome.healthy_shards, vec![0]);
    match outcome.state.state {
        ShardState::Transition(t) => {
            assert_eq!(t.want_shards, 1);
            assert_eq!(t.last_stable_count, 2);
        }
        other => panic!("expected transition, got {other:?}"),
    }
}

#[tokio::test]
async fn unreported_shards_keep_their_health() {
    let mut cluster = cluster().await;
    cluster.set_shard_health_everywhere(0, true);
    cluster.set_shard_health_everywhere(1, true);
    cluster.run_round().await.unwrap();

    for node in cluster.nodes() {
        node.store().set_all_shard_health(HashMap::new());
    }
    let outcome = cluster.run_round().await.unwrap();
    assert_eq!(outcome.healthy_shards, vec![0, 1]);
}

#[tokio::test]
async fn median_time_ignores_a_skewed_clock() {
    let mut cluster = cluster().await;
    cluster.set_shard_health_everywhere(0, true);
    cluster.set_shard_health_everywhere(1, true);
    cluster.node(1).clock.advance(Duration::from_secs(10));
    cluster.node(2).clock.advance(Duration::from_secs(20));
    cluster.node(3).clock.advance(Duration::from_secs(100_000));

    let outcome = cluster.run_round().await.unwrap();
    match outcome.state.state {
        ShardState::Transition(t) => {
            assert_eq!(t.changes_safe_after, epoch() + Duration::from_secs(320));
        }
        other => panic!("expected transition, got {other:?}"),
    }
}

#[tokio::test]
async fn arbiter_failure_still_applies_outcome() {
    let mut cluster = cluster().await;
    cluster.set_shard_health_everywhere(0, true);
    cluster.arbiter().set_failing(true);

    let err = cluster.run_round().await.unwrap_err();
    assert!(matches!(err, ClusterError::Ring(RingError::Arbiter { .. })));

    // Every oracle attempted the call and applied the outcome
    assert_eq!(cluster.arbiter().calls(), vec![1; N]);
    assert_eq!(cluster.seq_nr(), 1);
    for node in cluster.nodes() {
        assert_eq!(node.store().routing_state(), Some(RoutingState::steady(0, 1)));
    }

    cluster.arbiter().set_failing(false);
    assert!(cluster.run_round().await.is_ok());
}

#[tokio::test]
async fn offline_minority_does_not_block_rounds() {
    let mut cluster = cluster().await;
    cluster.set_shard_health_everywhere(0, true);
    cluster.set_offline(3, true);

    let outcome = cluster.run_round().await.unwrap();
    assert_eq!(outcome.healthy_shards, vec![0]);
    assert_eq!(cluster.arbiter().calls().len(), N - 1);
    assert_eq!(cluster.node(3).store().routing_state(), None);
}
