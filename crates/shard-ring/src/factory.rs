//! Ring plugin factory and service lifecycle.
//!
//! The factory is created once per node. It owns the shared [`Store`] and the
//! arbiter connection, and hands out a fresh [`RingPlugin`] whenever the OCR3
//! engine installs a new configuration.

use crate::arbiter::ArbiterScaler;
use crate::clock::{Clock, SystemClock};
use crate::config::ConsensusConfig;
use crate::error::{Result, RingError};
use crate::plugin::{RingPlugin, PLUGIN_NAME};
use crate::store::Store;
use crate::transmitter::RingTransmitter;
use async_trait::async_trait;
use ocr3_plugin::{
    Account, HealthReport, ReportingPluginConfig, ReportingPluginFactory, ReportingPluginInfo,
    Service, ServiceError, StartStopOnce,
};
use std::sync::Arc;
use tracing::info;

/// Service name used in health reports.
pub const FACTORY_NAME: &str = "RingPluginFactory";

pub struct RingFactory {
    store: Arc<Store>,
    arbiter: Arc<dyn ArbiterScaler>,
    config: ConsensusConfig,
    clock: Arc<dyn Clock>,
    lifecycle: StartStopOnce,
}

impl RingFactory {
    /// Create a factory.
    ///
    /// Zero-valued config fields take their defaults; `max_shard_count` must
    /// be set. Errors with `Config` otherwise.
    pub fn new(
        store: Arc<Store>,
        arbiter: Arc<dyn ArbiterScaler>,
        config: ConsensusConfig,
    ) -> Result<Self> {
        let config = config.normalized();
        config
            .validate()
            .map_err(|reason| RingError::Config { reason })?;

        Ok(Self {
            store,
            arbiter,
            config,
            clock: Arc::new(SystemClock),
            lifecycle: StartStopOnce::new(FACTORY_NAME),
        })
    }

    /// Replace the clock used for observation timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Transmitter sharing this factory's store and arbiter.
    pub fn new_contract_transmitter(&self, from_account: impl Into<Account>) -> RingTransmitter {
        RingTransmitter::new(
            self.store.clone(),
            Some(self.arbiter.clone()),
            from_account,
        )
    }
}

#[async_trait]
impl ReportingPluginFactory<()> for RingFactory {
    type Plugin = RingPlugin;
    type Error = RingError;

    async fn new_reporting_plugin(
        &self,
        config: ReportingPluginConfig,
    ) -> Result<(RingPlugin, ReportingPluginInfo)> {
        let plugin = RingPlugin::new(
            self.store.clone(),
            &config,
            self.config.clone(),
            self.clock.clone(),
        )?;

        info!(
            config_digest = %config.config_digest,
            n = config.n,
            f = config.f,
            max_shard_count = self.config.max_shard_count,
            "created ring plugin"
        );

        Ok((
            plugin,
            ReportingPluginInfo {
                name: PLUGIN_NAME.to_string(),
                limits: RingPlugin::limits(),
            },
        ))
    }
}

#[async_trait]
impl Service for RingFactory {
    fn name(&self) -> String {
        self.lifecycle.name().to_string()
    }

    async fn start(&self) -> std::result::Result<(), ServiceError> {
        self.lifecycle.start()
    }

    async fn close(&self) -> std::result::Result<(), ServiceError> {
        self.lifecycle.stop()?;
        self.store.close();
        Ok(())
    }

    fn ready(&self) -> std::result::Result<(), ServiceError> {
        self.lifecycle.ready()
    }

    fn health_report(&self) -> HealthReport {
        self.lifecycle.health_report()
    }
}
