//! ocr3-plugin: the contract between the OCR3 engine and reporting plugins.
//!
//! The OCR3 engine drives a replicated state machine round by round and calls
//! into a plugin for the consensus payload:
//! - `query` (leader) → `observation` (every oracle) → `validate_observation`
//! - `observation_quorum` → `outcome` (every oracle, deterministic)
//! - `reports` → `should_accept_attested_report` → `should_transmit_accepted_report`
//! - `ContractTransmitter::transmit` for the accepted reports
//!
//! This crate holds only the types and traits that cross that boundary, the
//! quorum arithmetic shared by all plugins, and the start/stop lifecycle the
//! plugin host expects from long-lived services.

pub mod error;
pub mod plugin;
pub mod quorum;
pub mod service;
pub mod transmitter;
pub mod types;

pub use error::ServiceError;
pub use plugin::{ReportingPlugin, ReportingPluginFactory};
pub use quorum::Quorum;
pub use service::{HealthReport, Service, ServiceState, StartStopOnce};
pub use transmitter::ContractTransmitter;
pub use types::*;
