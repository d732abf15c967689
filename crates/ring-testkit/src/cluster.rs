//! In-process OCR3 round driver.
//!
//! Runs the full plugin lifecycle for a committee of N oracles without any
//! networking:
//!
//! ```text
//! query (leader) → observation (each online oracle) → validate (leader)
//!   → quorum (leader) → outcome (every oracle, must agree byte-for-byte)
//!   → reports (leader) → accept/transmit (each online oracle)
//! ```
//!
//! Oracle 0 acts as leader in every round. Offline oracles contribute no
//! observation and transmit nothing, but still compute the outcome so that
//! divergence is caught on every node.

use crate::arbiter::RecordingArbiter;
use crate::clock::ManualClock;
use bytes::Bytes;
use ocr3_plugin::{
    AttributedObservation, ConfigDigest, ContractTransmitter, OracleId, OutcomeContext,
    ReportingPlugin, ReportingPluginConfig, ReportingPluginFactory, SeqNr, Service,
};
use shard_ring::{
    ConsensusConfig, Outcome, RingError, RingFactory, RingPlugin, RingTransmitter, ShardId, Store,
    MAX_ORACLES,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from driving a round.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error(transparent)]
    Ring(#[from] RingError),

    #[error("observation quorum not reached with {have} valid observations")]
    NoQuorum { have: usize },

    #[error("oracle {oracle} computed a different outcome in round {seq_nr}")]
    Divergent { seq_nr: SeqNr, oracle: usize },

    #[error("oracle count {0} exceeds the 256 addressable oracles")]
    TooManyOracles(usize),
}

/// One oracle: its factory (and store), plugin instance and transmitter.
pub struct RingNode {
    pub factory: RingFactory,
    pub plugin: RingPlugin,
    pub transmitter: RingTransmitter,
    pub clock: Arc<ManualClock>,
}

impl RingNode {
    pub fn store(&self) -> &Arc<Store> {
        self.factory.store()
    }
}

/// Committee of oracles sharing one arbiter.
pub struct RingCluster {
    nodes: Vec<RingNode>,
    arbiter: Arc<RecordingArbiter>,
    offline: BTreeSet<usize>,
    config_digest: ConfigDigest,
    seq_nr: SeqNr,
    previous_outcome: Bytes,
}

impl RingCluster {
    /// Build and start `n` oracles tolerating `f` faults, all clocks at `now`.
    pub async fn new(
        n: usize,
        f: usize,
        config: ConsensusConfig,
        now: SystemTime,
    ) -> Result<Self, ClusterError> {
        if n > MAX_ORACLES {
            return Err(ClusterError::TooManyOracles(n));
        }

        let arbiter = Arc::new(RecordingArbiter::new());
        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let clock = Arc::new(ManualClock::new(now));
            let factory = RingFactory::new(Arc::new(Store::new()), arbiter.clone(), config.clone())?
                .with_clock(clock.clone());
            factory.start().await.map_err(RingError::from)?;

            let oracle_id = OracleId(i as u8);
            let (plugin, _info) = factory
                .new_reporting_plugin(ReportingPluginConfig::new(oracle_id, n, f))
                .await?;
            let transmitter = factory.new_contract_transmitter(format!("oracle-{i}"));

            nodes.push(RingNode {
                factory,
                plugin,
                transmitter,
                clock,
            });
        }

        Ok(Self {
            nodes,
            arbiter,
            offline: BTreeSet::new(),
            config_digest: ConfigDigest([7; 32]),
            seq_nr: 0,
            previous_outcome: Bytes::new(),
        })
    }

    pub fn nodes(&self) -> &[RingNode] {
        &self.nodes
    }

    pub fn node(&self, i: usize) -> &RingNode {
        &self.nodes[i]
    }

    pub fn arbiter(&self) -> &Arc<RecordingArbiter> {
        &self.arbiter
    }

    /// Sequence number of the last completed round (0 before the first).
    pub fn seq_nr(&self) -> SeqNr {
        self.seq_nr
    }

    /// Encoded outcome of the last completed round.
    pub fn previous_outcome(&self) -> &Bytes {
        &self.previous_outcome
    }

    /// Seed the outcome the next round builds on.
    pub fn set_previous_outcome(&mut self, outcome: &Outcome) -> Result<(), ClusterError> {
        self.previous_outcome = outcome.encode()?;
        Ok(())
    }

    pub fn set_offline(&mut self, i: usize, offline: bool) {
        if offline {
            self.offline.insert(i);
        } else {
            self.offline.remove(&i);
        }
    }

    /// Record one oracle's local view of a shard.
    pub fn set_shard_health(&self, oracle: usize, shard: ShardId, healthy: bool) {
        self.nodes[oracle].store().set_shard_health(shard, healthy);
    }

    /// Record the same view of a shard on every oracle.
    pub fn set_shard_health_everywhere(&self, shard: ShardId, healthy: bool) {
        for node in &self.nodes {
            node.store().set_shard_health(shard, healthy);
        }
    }

    /// Advance every oracle's clock.
    pub fn advance(&self, by: Duration) {
        for node in &self.nodes {
            node.clock.advance(by);
        }
    }

    /// Run one complete round and return the agreed outcome.
    ///
    /// Every online oracle transmits even if an earlier transmission failed;
    /// the first transmission error is returned after the round completes.
    pub async fn run_round(&mut self) -> Result<Outcome, ClusterError> {
        let seq_nr = self.seq_nr + 1;
        let outctx = OutcomeContext {
            seq_nr,
            previous_outcome: self.previous_outcome.clone(),
            ..Default::default()
        };
        let leader = &self.nodes[0].plugin;

        let query = leader.query(&outctx).await?;

        let mut aos = Vec::with_capacity(self.nodes.len());
        for (i, node) in self.online() {
            let observation = node.plugin.observation(&outctx, &query).await?;
            let ao = AttributedObservation::new(OracleId(i as u8), observation);
            match leader.validate_observation(&outctx, &query, &ao).await {
                Ok(()) => aos.push(ao),
                Err(err) => warn!(oracle = i, error = %err, "dropping invalid observation"),
            }
        }

        if !leader.observation_quorum(&outctx, &query, &aos).await? {
            return Err(ClusterError::NoQuorum { have: aos.len() });
        }

        let mut outcomes = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            outcomes.push(node.plugin.outcome(&outctx, &query, &aos).await?);
        }
        let Some(outcome) = outcomes.first().cloned() else {
            return Err(ClusterError::NoQuorum { have: aos.len() });
        };
        if let Some(oracle) = outcomes.iter().position(|other| *other != outcome) {
            return Err(ClusterError::Divergent { seq_nr, oracle });
        }

        let reports = leader.reports(seq_nr, &outcome).await?;
        let mut first_err = None;
        for report in reports {
            let report = report.report_with_info;
            for (i, node) in self.online() {
                if !node.plugin.should_accept_attested_report(seq_nr, &report).await?
                    || !node.plugin.should_transmit_accepted_report(seq_nr, &report).await?
                {
                    continue;
                }
                if let Err(err) = node
                    .transmitter
                    .transmit(self.config_digest, seq_nr, report.clone(), Vec::new())
                    .await
                {
                    warn!(oracle = i, error = %err, "transmission failed");
                    first_err.get_or_insert(err);
                }
            }
        }

        self.seq_nr = seq_nr;
        self.previous_outcome = outcome.clone();
        debug!(seq_nr, observations = aos.len(), "round complete");

        match first_err {
            Some(err) => Err(err.into()),
            None => Ok(Outcome::decode(&outcome)?),
        }
    }

    fn online(&self) -> impl Iterator<Item = (usize, &RingNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(i, _)| !self.offline.contains(i))
    }
}
