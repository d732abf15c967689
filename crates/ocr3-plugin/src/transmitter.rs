//! Contract transmitter abstraction.
//!
//! The engine hands every accepted, attested report to a transmitter. For
//! on-chain plugins this submits a transaction; off-chain plugins apply the
//! report to local state or forward it to another service.

use crate::types::*;
use async_trait::async_trait;

#[async_trait]
pub trait ContractTransmitter<I>: Send + Sync
where
    I: Send + Sync + 'static,
{
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deliver an attested report.
    async fn transmit(
        &self,
        config_digest: ConfigDigest,
        seq_nr: SeqNr,
        report: ReportWithInfo<I>,
        signatures: Vec<AttributedOnchainSignature>,
    ) -> Result<(), Self::Error>;

    /// Account this transmitter sends from.
    async fn from_account(&self) -> Result<Account, Self::Error>;
}
