//! Service lifecycle errors.

use thiserror::Error;

use crate::service::ServiceState;

/// Errors from the start/stop lifecycle of a service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// `start` called on a service that already left the unstarted state.
    #[error("{name} cannot start (state: {state})")]
    CannotStart { name: String, state: ServiceState },

    /// `close` called on a service that is not running.
    #[error("{name} cannot stop (state: {state})")]
    CannotStop { name: String, state: ServiceState },

    /// Service is not running.
    #[error("{name} not ready (state: {state})")]
    NotReady { name: String, state: ServiceState },
}
