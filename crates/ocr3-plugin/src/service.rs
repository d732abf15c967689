//! Service lifecycle (start once, stop once) and health reporting.
//!
//! The plugin host starts every long-lived component exactly once and closes
//! it exactly once:
//!
//! ```text
//! Unstarted --start--> Started --close--> Stopped
//! ```
//!
//! Any other transition is an error. `ready` succeeds only in `Started`.

use crate::error::ServiceError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;

/// Health of a service and its sub-services, keyed by name.
pub type HealthReport = BTreeMap<String, Result<(), ServiceError>>;

/// Long-lived component managed by the plugin host.
#[async_trait]
pub trait Service: Send + Sync {
    fn name(&self) -> String;

    async fn start(&self) -> Result<(), ServiceError>;

    async fn close(&self) -> Result<(), ServiceError>;

    fn ready(&self) -> Result<(), ServiceError>;

    fn health_report(&self) -> HealthReport;
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Unstarted,
    Started,
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Unstarted => write!(f, "Unstarted"),
            ServiceState::Started => write!(f, "Started"),
            ServiceState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Guards the start/stop transitions of a service.
pub struct StartStopOnce {
    name: String,
    state: Mutex<ServiceState>,
}

impl StartStopOnce {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(ServiceState::Unstarted),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ServiceState {
        *self.state.lock()
    }

    /// Unstarted → Started.
    pub fn start(&self) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        if *state != ServiceState::Unstarted {
            return Err(ServiceError::CannotStart {
                name: self.name.clone(),
                state: *state,
            });
        }
        *state = ServiceState::Started;
        tracing::debug!(service = %self.name, "service started");
        Ok(())
    }

    /// Started → Stopped.
    pub fn stop(&self) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        if *state != ServiceState::Started {
            return Err(ServiceError::CannotStop {
                name: self.name.clone(),
                state: *state,
            });
        }
        *state = ServiceState::Stopped;
        tracing::debug!(service = %self.name, "service stopped");
        Ok(())
    }

    pub fn ready(&self) -> Result<(), ServiceError> {
        let state = self.state();
        if state == ServiceState::Started {
            Ok(())
        } else {
            Err(ServiceError::NotReady {
                name: self.name.clone(),
                state,
            })
        }
    }

    /// Single-entry report for this service.
    pub fn health_report(&self) -> HealthReport {
        let mut report = HealthReport::new();
        report.insert(self.name.clone(), self.ready());
        report
    }
}
