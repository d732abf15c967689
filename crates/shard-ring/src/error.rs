//! Ring error types.

use ocr3_plugin::ServiceError;
use thiserror::Error;

/// Ring errors.
#[derive(Error, Debug)]
pub enum RingError {
    /// Configuration error (invalid consensus or committee config).
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// State transition requested without a current state.
    #[error("Routing state is nil")]
    NilState,

    /// Not enough observation timestamps to agree on the round time.
    #[error("Insufficient timestamps (need {need}, have {have})")]
    InsufficientTimestamps { need: usize, have: usize },

    /// Malformed observation, outcome or report bytes.
    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: bincode::Error,
    },

    /// Failed to encode an observation or outcome.
    #[error("Failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: bincode::Error,
    },

    /// ArbiterScaler call failed.
    #[error("Arbiter error: {reason}")]
    Arbiter { reason: String },

    /// Store was closed while a caller waited for an allocation.
    #[error("Store closed")]
    StoreClosed,

    /// Lifecycle misuse.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Ring result type.
pub type Result<T> = std::result::Result<T, RingError>;
