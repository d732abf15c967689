//! Ring reporting plugin.
//!
//! Per round:
//! 1. `observation`: local shard health + routed and pending workflows + local time
//! 2. `outcome`: health votes (> F), workflow union, median time (needs F + 1
//!    timestamps), next routing state, routes from the consistent-hash ring
//! 3. `reports`: the outcome bytes as a single report, transmitted by every
//!    oracle immediately
//!
//! No method keeps state between calls apart from the shared [`Store`]; the
//! outcome is a pure function of the previous outcome and the observations.

use crate::clock::Clock;
use crate::config::ConsensusConfig;
use crate::error::{Result, RingError};
use crate::router::HashRing;
use crate::state::next_state;
use crate::store::Store;
use crate::types::*;
use async_trait::async_trait;
use bytes::Bytes;
use ocr3_plugin::quorum::{observation_count_reaches_quorum, Quorum};
use ocr3_plugin::{
    AttributedObservation, OracleId, OutcomeContext, ReportPlus, ReportWithInfo,
    ReportingPlugin, ReportingPluginConfig, ReportingPluginLimits, SeqNr, TransmissionSchedule,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Name reported to the engine.
pub const PLUGIN_NAME: &str = "RingPlugin";

const MAX_PAYLOAD_LENGTH: usize = 1024 * 1024;

/// Largest committee addressable with `OracleId(u8)`.
pub const MAX_ORACLES: usize = 256;

/// Shard-routing reporting plugin for one OCR3 configuration.
pub struct RingPlugin {
    store: Arc<Store>,
    n: usize,
    f: usize,
    consensus: ConsensusConfig,
    clock: Arc<dyn Clock>,
}

/// Per-shard vote tally for one round.
#[derive(Debug, Default, Clone, Copy)]
struct HealthVotes {
    healthy: usize,
    unhealthy: usize,
}

impl RingPlugin {
    /// Create a plugin for a committee of `config.n` oracles tolerating
    /// `config.f` faults.
    ///
    /// Errors with `Config` when the consensus config is invalid, the
    /// committee cannot tolerate `f` Byzantine oracles (`n <= 3f`) or has
    /// more than [`MAX_ORACLES`] members.
    pub fn new(
        store: Arc<Store>,
        config: &ReportingPluginConfig,
        consensus: ConsensusConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let consensus = consensus.normalized();
        consensus
            .validate()
            .map_err(|reason| RingError::Config { reason })?;

        if config.n == 0 || config.n <= 3 * config.f {
            return Err(RingError::Config {
                reason: format!("n ({}) must be > 3f (f = {})", config.n, config.f),
            });
        }
        if config.n > MAX_ORACLES {
            return Err(RingError::Config {
                reason: format!("n ({}) must be <= {}", config.n, MAX_ORACLES),
            });
        }

        Ok(Self {
            store,
            n: config.n,
            f: config.f,
            consensus,
            clock,
        })
    }

    /// Payload limits advertised to the engine.
    pub fn limits() -> ReportingPluginLimits {
        ReportingPluginLimits {
            max_query_length: 0,
            max_observation_length: MAX_PAYLOAD_LENGTH,
            max_outcome_length: MAX_PAYLOAD_LENGTH,
            max_report_length: MAX_PAYLOAD_LENGTH,
            max_report_count: 1,
        }
    }

    /// Reduce the observations of a round to its outcome.
    fn compute_outcome(
        &self,
        previous_outcome: &[u8],
        aos: &[AttributedObservation],
    ) -> Result<Outcome> {
        let (prior_state, prior_healthy) = match Outcome::decode_previous(previous_outcome)? {
            Some(prior) => (prior.state, prior.healthy_shards),
            None => {
                debug!("no previous outcome, bootstrapping with one shard");
                (RoutingState::steady(0, 1), Vec::new())
            }
        };

        let mut votes: BTreeMap<ShardId, HealthVotes> = BTreeMap::new();
        let mut workflow_ids: BTreeSet<String> = BTreeSet::new();
        let mut timestamps: Vec<SystemTime> = Vec::with_capacity(aos.len());

        for ao in aos {
            let observation = match Observation::decode(&ao.observation) {
                Ok(observation) => observation,
                Err(err) => {
                    warn!(observer = %ao.observer, error = %err, "skipping undecodable observation");
                    continue;
                }
            };

            for (shard, healthy) in observation.shard_health_status {
                let tally = votes.entry(shard).or_default();
                if healthy {
                    tally.healthy += 1;
                } else {
                    tally.unhealthy += 1;
                }
            }
            workflow_ids.extend(observation.workflow_ids);
            timestamps.push(observation.now);
        }

        let need = Quorum::FPlusOne.threshold(self.f);
        if timestamps.len() < need {
            return Err(RingError::InsufficientTimestamps {
                need,
                have: timestamps.len(),
            });
        }
        timestamps.sort_unstable();
        let now = timestamps[timestamps.len() / 2];

        // Start from the previous agreed health and apply this round's votes.
        // More than F votes either way guarantees at least one honest voter;
        // shards without such a majority keep their previous health.
        let mut health: BTreeMap<ShardId, bool> =
            prior_healthy.iter().map(|shard| (*shard, true)).collect();
        for (shard, tally) in &votes {
            if tally.healthy > self.f {
                health.insert(*shard, true);
                self.store.set_shard_health(*shard, true);
            } else if tally.unhealthy > self.f {
                health.insert(*shard, false);
                self.store.set_shard_health(*shard, false);
            }
        }
        let healthy_shards: Vec<ShardId> = health
            .into_iter()
            .filter(|(_, healthy)| *healthy)
            .map(|(shard, _)| shard)
            .collect();

        let want = self
            .consensus
            .clamp_shards(u32::try_from(healthy_shards.len()).unwrap_or(u32::MAX));
        let state = next_state(Some(&prior_state), want, now, self.consensus.time_to_sync)?;
        if state.id != prior_state.id {
            info!(from = %prior_state, to = %state, "routing state changed");
        }

        let ring = HashRing::new(want);
        let routes = workflow_ids
            .into_iter()
            .map(|id| {
                let shard = ring.locate(&id);
                (id, WorkflowRoute { shard })
            })
            .collect();

        Ok(Outcome {
            state,
            routes,
            healthy_shards,
        })
    }
}

#[async_trait]
impl ReportingPlugin<()> for RingPlugin {
    type Error = RingError;

    async fn query(&self, _outctx: &OutcomeContext) -> Result<Bytes> {
        Ok(Bytes::new())
    }

    async fn observation(&self, outctx: &OutcomeContext, _query: &[u8]) -> Result<Bytes> {
        let shard_health_status: BTreeMap<ShardId, bool> =
            self.store.shard_health().into_iter().collect();

        let mut workflow_ids: Vec<String> = self.store.routes().into_keys().collect();
        workflow_ids.extend(self.store.pending_allocations(self.consensus.batch_size));
        workflow_ids.sort_unstable();
        workflow_ids.dedup();

        debug!(
            seq_nr = outctx.seq_nr,
            shards = shard_health_status.len(),
            workflows = workflow_ids.len(),
            "built observation"
        );

        Observation {
            shard_health_status,
            workflow_ids,
            now: self.clock.now(),
        }
        .encode()
    }

    async fn validate_observation(
        &self,
        _outctx: &OutcomeContext,
        _query: &[u8],
        ao: &AttributedObservation,
    ) -> Result<()> {
        Observation::decode(&ao.observation).map(|_| ())
    }

    async fn observation_quorum(
        &self,
        _outctx: &OutcomeContext,
        _query: &[u8],
        aos: &[AttributedObservation],
    ) -> Result<bool> {
        Ok(observation_count_reaches_quorum(
            Quorum::TwoFPlusOne,
            self.f,
            aos,
        ))
    }

    async fn outcome(
        &self,
        outctx: &OutcomeContext,
        _query: &[u8],
        aos: &[AttributedObservation],
    ) -> Result<Bytes> {
        let outcome = self.compute_outcome(&outctx.previous_outcome, aos)?;

        debug!(
            seq_nr = outctx.seq_nr,
            state = %outcome.state,
            healthy_shards = outcome.healthy_shards.len(),
            routes = outcome.routes.len(),
            "computed outcome"
        );

        outcome.encode()
    }

    async fn reports(&self, seq_nr: SeqNr, outcome: &[u8]) -> Result<Vec<ReportPlus<()>>> {
        // n <= MAX_ORACLES, checked in new
        let transmitters: Vec<OracleId> = (0..self.n).map(|i| OracleId(i as u8)).collect();
        let transmission_delays = vec![Duration::ZERO; transmitters.len()];

        debug!(seq_nr, "built report");

        Ok(vec![ReportPlus {
            report_with_info: ReportWithInfo {
                report: Bytes::copy_from_slice(outcome),
                info: (),
            },
            transmission_schedule_override: Some(TransmissionSchedule {
                transmitters,
                transmission_delays,
            }),
        }])
    }

    async fn should_accept_attested_report(
        &self,
        _seq_nr: SeqNr,
        _report: &ReportWithInfo<()>,
    ) -> Result<bool> {
        Ok(true)
    }

    async fn should_transmit_accepted_report(
        &self,
        _seq_nr: SeqNr,
        _report: &ReportWithInfo<()>,
    ) -> Result<bool> {
        Ok(true)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
