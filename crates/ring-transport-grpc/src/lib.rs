//! gRPC transport for the shard-ring arbiter.
//!
//! Implements [`shard_ring::ArbiterScaler`] against the service defined in
//! `proto/arbiter.proto`:
//! - ArbiterScaler: ConsensusWantShards

pub mod arbiter;
pub mod config;
pub mod proto;

pub use arbiter::GrpcArbiterScaler;
pub use config::GrpcArbiterConfig;
