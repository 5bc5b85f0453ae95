//! Error hierarchy for the polling engine.
//!
//! Nothing in this crate surfaces these errors to the outer driver as a hard
//! failure. They travel as far as the owning handler, which turns them into a
//! state reset, a fault count or a log line.

use config::ConfigError;

use crate::ForeignAddr;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failures reading or navigating the foreign object graph
    #[error(transparent)]
    Foreign(#[from] ForeignError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum ForeignError {
    /// Handle wrapper absent or address is the null sentinel
    #[error("Foreign handle is null")]
    NullHandle,

    /// Object was freed or relocated by the foreign runtime
    #[error("Foreign object at {addr} is no longer live")]
    Disposed { addr: ForeignAddr },

    /// Single field could not be read
    #[error("Field `{field}` is unreadable")]
    Unreadable { field: String },

    /// Runtime type did not match the expected class
    #[error("Expected `{expected}` but found `{found}`")]
    TypeMismatch { expected: String, found: String },

    /// Field holds a value of a different shape than requested
    #[error("Field `{field}` does not hold {expected}")]
    UnexpectedValue {
        field: String,
        expected: &'static str,
    },

    /// Live-ness probe itself failed
    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    /// Instance enumeration failed
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),
}

impl ForeignError {
    /// The handle went away underneath us. The owner releases and retries on
    /// the next eligible tick instead of counting a fault.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ForeignError::NullHandle | ForeignError::Disposed { .. } | ForeignError::TypeMismatch { .. }
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Driver not loaded or no screen reader detected
    #[error("Output backend unavailable")]
    Unavailable,

    #[error("Output backend failed: {0}")]
    Backend(String),
}

impl Error {
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Foreign(e) => e.is_transient(),
            _ => false,
        }
    }
}
