//! Engine-side types handed to reporting plugins.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Sequence number of a round (monotonically increasing per config digest).
pub type SeqNr = u64;

/// Account identity used by a transmitter.
pub type Account = String;

/// Oracle identifier within one configuration (0..n).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OracleId(pub u8);

impl OracleId {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for OracleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O{}", self.0)
    }
}

/// Digest identifying one OCR3 configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ConfigDigest(pub [u8; 32]);

impl fmt::Display for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Configuration the engine passes when instantiating a plugin for a config digest.
#[derive(Debug, Clone)]
pub struct ReportingPluginConfig {
    pub config_digest: ConfigDigest,

    /// This oracle's ID
    pub oracle_id: OracleId,

    /// Total number of oracles
    pub n: usize,

    /// Maximum number of faulty oracles tolerated
    pub f: usize,

    /// Opaque configuration set on-chain
    pub onchain_config: Bytes,

    /// Opaque configuration for the plugin, set off-chain
    pub offchain_config: Bytes,

    pub estimated_round_interval: Duration,
    pub max_duration_query: Duration,
    pub max_duration_observation: Duration,
    pub max_duration_should_accept_attested_report: Duration,
    pub max_duration_should_transmit_accepted_report: Duration,
}

impl ReportingPluginConfig {
    /// Config with the given committee size and engine default durations.
    pub fn new(oracle_id: OracleId, n: usize, f: usize) -> Self {
        Self {
            config_digest: ConfigDigest::default(),
            oracle_id,
            n,
            f,
            onchain_config: Bytes::new(),
            offchain_config: Bytes::new(),
            estimated_round_interval: Duration::from_secs(1),
            max_duration_query: Duration::from_secs(1),
            max_duration_observation: Duration::from_secs(1),
            max_duration_should_accept_attested_report: Duration::from_secs(1),
            max_duration_should_transmit_accepted_report: Duration::from_secs(1),
        }
    }
}

/// Round context handed to `query`, `observation` and `outcome`.
#[derive(Debug, Clone, Default)]
pub struct OutcomeContext {
    pub seq_nr: SeqNr,

    /// Outcome agreed in round `seq_nr - 1` (empty in the first round)
    pub previous_outcome: Bytes,

    pub epoch: u64,
    pub round: u64,
}

/// An observation together with the oracle that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributedObservation {
    pub observation: Bytes,
    pub observer: OracleId,
}

impl AttributedObservation {
    pub fn new(observer: OracleId, observation: impl Into<Bytes>) -> Self {
        Self {
            observation: observation.into(),
            observer,
        }
    }
}

/// Report bytes plus plugin-specific metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWithInfo<I> {
    pub report: Bytes,
    pub info: I,
}

/// Which oracles transmit a report, and after what delay each.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransmissionSchedule {
    pub transmitters: Vec<OracleId>,
    pub transmission_delays: Vec<Duration>,
}

/// Report produced by `reports`, with an optional schedule override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPlus<I> {
    pub report_with_info: ReportWithInfo<I>,
    pub transmission_schedule_override: Option<TransmissionSchedule>,
}

/// Signature of one oracle over an attested report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributedOnchainSignature {
    pub signature: Bytes,
    pub signer: OracleId,
}

/// Size limits the engine enforces on plugin payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportingPluginLimits {
    pub max_query_length: usize,
    pub max_observation_length: usize,
    pub max_outcome_length: usize,
    pub max_report_length: usize,
    pub max_report_count: usize,
}

/// Metadata returned alongside a newly created plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingPluginInfo {
    pub name: String,
    pub limits: ReportingPluginLimits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_digest_display_is_hex() {
        let mut digest = ConfigDigest::default();
        digest.0[0] = 0xab;
        digest.0[31] = 0x01;
        let s = digest.to_string();
        assert_eq!(s.len(), 64);
        assert!(s.starts_with("ab"));
        assert!(s.ends_with("01"));
    }

    #[test]
    fn test_oracle_id_ordering() {
        assert!(OracleId(2) > OracleId(1));
        assert_eq!(OracleId(3).as_usize(), 3);
        assert_eq!(OracleId(7).to_string(), "O7");
    }
}
