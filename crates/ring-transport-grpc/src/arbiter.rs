//! ArbiterScaler over gRPC.
//!
//! Provides GrpcArbiterScaler which implements the ArbiterScaler trait,
//! forwarding the agreed shard count to a remote arbiter.

use crate::config::GrpcArbiterConfig;
use crate::proto::{arbiter_scaler_client::ArbiterScalerClient, ConsensusWantShardsRequest};
use shard_ring::{ArbiterScaler, Result, RingError};
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

/// gRPC ArbiterScaler client.
///
/// Holds one channel; tonic reconnects it as needed. Calls are made once,
/// failures are returned to the transmitter without retry.
#[derive(Debug, Clone)]
pub struct GrpcArbiterScaler {
    client: ArbiterScalerClient<Channel>,
    addr: String,
}

impl GrpcArbiterScaler {
    /// Connect to the arbiter, failing if it is unreachable.
    pub async fn connect(config: &GrpcArbiterConfig) -> Result<Self> {
        let channel = Self::endpoint(config)?
            .connect()
            .await
            .map_err(|e| RingError::Arbiter {
                reason: format!("Failed to connect to {}: {}", config.addr, e),
            })?;

        Ok(Self::from_channel(channel, config.addr.clone()))
    }

    /// Create a client that connects on first use.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect_lazy(config: &GrpcArbiterConfig) -> Result<Self> {
        let channel = Self::endpoint(config)?.connect_lazy();
        Ok(Self::from_channel(channel, config.addr.clone()))
    }

    /// Wrap an existing channel.
    pub fn from_channel(channel: Channel, addr: impl Into<String>) -> Self {
        Self {
            client: ArbiterScalerClient::new(channel),
            addr: addr.into(),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn endpoint(config: &GrpcArbiterConfig) -> Result<Endpoint> {
        config
            .validate()
            .map_err(|reason| RingError::Config { reason })?;

        Ok(Endpoint::from_shared(config.uri())
            .map_err(|e| RingError::Config {
                reason: format!("Invalid arbiter endpoint: {}", e),
            })?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout))
    }
}

#[tonic::async_trait]
impl ArbiterScaler for GrpcArbiterScaler {
    async fn consensus_want_shards(&self, n_shards: u32) -> Result<()> {
        let mut client = self.client.clone();

        client
            .consensus_want_shards(ConsensusWantShardsRequest { n_shards })
            .await
            .map_err(|status| RingError::Arbiter {
                reason: format!("ConsensusWantShards RPC failed: {}", status),
            })?;

        debug!(addr = %self.addr, n_shards, "arbiter acknowledged shard count");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_rejected() {
        let err = GrpcArbiterScaler::connect_lazy(&GrpcArbiterConfig::default()).unwrap_err();
        assert!(matches!(err, RingError::Config { .. }));
    }

    #[tokio::test]
    async fn test_connect_lazy_keeps_addr() {
        let arbiter =
            GrpcArbiterScaler::connect_lazy(&GrpcArbiterConfig::new("127.0.0.1:7001")).unwrap();
        assert_eq!(arbiter.addr(), "127.0.0.1:7001");
    }
}
