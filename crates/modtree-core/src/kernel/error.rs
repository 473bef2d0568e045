//! # Modtree Kernel Errors
//!
//! Defines the top-level error type of the engine.
//!
//! [`Error`] wraps the typed errors of each subsystem ([`TreeError`],
//! [`ComponentError`], [`DispatchError`], [`ConfigError`]) so host-facing entry
//! points can return a single [`Result`] while callers can still match on the
//! subsystem that failed.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::component::error::ComponentError;
use crate::config::error::ConfigError;
use crate::dispatch::error::DispatchError;
use crate::tree::error::TreeError;

/// Top-level error type for the engine
#[derive(Debug, ThisError)]
pub enum Error {
    /// Tree construction or lookup error
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    /// Component error (descriptor validation, reference not available, locks)
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    /// A fail-fast dispatch aborted
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Configuration loading or validation error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurring during a specific host lifecycle phase.
    #[error("Host error during {phase}: {message}")]
    HostLifecycle {
        phase: HostPhase,
        message: String,
        #[source]
        source: Option<Box<Error>>, // Can wrap a dispatch failure
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Represents a phase of the device host's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum HostPhase {
    #[error("Create")]
    Create,
    #[error("Deliver")]
    Deliver,
    #[error("Destroy")]
    Destroy,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    /// Helper to build a host lifecycle error without a source
    pub fn host(phase: HostPhase, message: impl Into<String>) -> Self {
        Error::HostLifecycle {
            phase,
            message: message.into(),
            source: None,
        }
    }
}
