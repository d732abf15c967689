//! Reporting plugin and factory traits.

use crate::types::*;
use async_trait::async_trait;
use bytes::Bytes;

/// A reporting plugin for one OCR3 configuration.
///
/// The engine calls these methods sequentially per round for a given oracle;
/// `outcome` must be deterministic so that honest oracles given the same
/// attributed observations produce byte-identical outcomes.
///
/// `I` is plugin-specific report metadata carried in [`ReportWithInfo`].
///
/// Cancellation: the engine drops the returned future once the phase deadline
/// passes.
#[async_trait]
pub trait ReportingPlugin<I>: Send + Sync
where
    I: Send + Sync + 'static,
{
    type Error: std::error::Error + Send + Sync + 'static;

    /// Query produced by the leader and handed to every observation.
    async fn query(&self, outctx: &OutcomeContext) -> Result<Bytes, Self::Error>;

    /// This oracle's observation for the round.
    async fn observation(
        &self,
        outctx: &OutcomeContext,
        query: &[u8],
    ) -> Result<Bytes, Self::Error>;

    /// Reject an observation from another oracle by returning an error.
    async fn validate_observation(
        &self,
        outctx: &OutcomeContext,
        query: &[u8],
        ao: &AttributedObservation,
    ) -> Result<(), Self::Error>;

    /// True once enough validated observations were collected to run `outcome`.
    async fn observation_quorum(
        &self,
        outctx: &OutcomeContext,
        query: &[u8],
        aos: &[AttributedObservation],
    ) -> Result<bool, Self::Error>;

    /// Deterministically reduce the observations to the round's outcome.
    async fn outcome(
        &self,
        outctx: &OutcomeContext,
        query: &[u8],
        aos: &[AttributedObservation],
    ) -> Result<Bytes, Self::Error>;

    /// Reports to be signed and transmitted for an outcome.
    async fn reports(&self, seq_nr: SeqNr, outcome: &[u8])
        -> Result<Vec<ReportPlus<I>>, Self::Error>;

    async fn should_accept_attested_report(
        &self,
        seq_nr: SeqNr,
        report: &ReportWithInfo<I>,
    ) -> Result<bool, Self::Error>;

    async fn should_transmit_accepted_report(
        &self,
        seq_nr: SeqNr,
        report: &ReportWithInfo<I>,
    ) -> Result<bool, Self::Error>;

    /// Release resources; no other method is called afterwards.
    async fn close(&self) -> Result<(), Self::Error>;
}

/// Creates a reporting plugin each time the engine installs a new configuration.
#[async_trait]
pub trait ReportingPluginFactory<I>: Send + Sync
where
    I: Send + Sync + 'static,
{
    type Plugin: ReportingPlugin<I>;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn new_reporting_plugin(
        &self,
        config: ReportingPluginConfig,
    ) -> Result<(Self::Plugin, ReportingPluginInfo), Self::Error>;
}
