//! Applies agreed outcomes locally and informs the arbiter.
//!
//! The store is updated before the arbiter is called and is never rolled
//! back: the local view must match what the network agreed, whether or not
//! the arbiter was reachable.

use crate::arbiter::ArbiterScaler;
use crate::error::Result;
use crate::store::Store;
use crate::types::Outcome;
use async_trait::async_trait;
use ocr3_plugin::{
    Account, AttributedOnchainSignature, ConfigDigest, ContractTransmitter, ReportWithInfo, SeqNr,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Transmitter for ring outcomes.
pub struct RingTransmitter {
    store: Arc<Store>,
    arbiter: Option<Arc<dyn ArbiterScaler>>,
    from_account: Account,
}

impl RingTransmitter {
    pub fn new(
        store: Arc<Store>,
        arbiter: Option<Arc<dyn ArbiterScaler>>,
        from_account: impl Into<Account>,
    ) -> Self {
        Self {
            store,
            arbiter,
            from_account: from_account.into(),
        }
    }

    /// Write an agreed outcome into the store.
    fn apply(&self, outcome: &Outcome) {
        let health: HashMap<_, _> = outcome
            .healthy_shards
            .iter()
            .map(|shard| (*shard, true))
            .collect();

        self.store.set_all_shard_health(health);
        self.store.set_routing_state(outcome.state);
        self.store.set_routes(outcome.shard_assignments());
    }
}

#[async_trait]
impl ContractTransmitter<()> for RingTransmitter {
    type Error = crate::error::RingError;

    async fn transmit(
        &self,
        _config_digest: ConfigDigest,
        seq_nr: SeqNr,
        report: ReportWithInfo<()>,
        _signatures: Vec<AttributedOnchainSignature>,
    ) -> Result<()> {
        let outcome = Outcome::decode(&report.report)?;
        self.apply(&outcome);

        debug!(
            seq_nr,
            state = %outcome.state,
            routes = outcome.routes.len(),
            "applied outcome"
        );

        let Some(arbiter) = &self.arbiter else {
            return Ok(());
        };

        let n_shards = outcome.state.target_shards();
        arbiter.consensus_want_shards(n_shards).await.map_err(|err| {
            warn!(seq_nr, n_shards, error = %err, "arbiter notification failed");
            err
        })
    }

    async fn from_account(&self) -> Result<Account> {
        Ok(self.from_account.clone())
    }
}
