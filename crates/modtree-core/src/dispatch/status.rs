use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure status a handler reports through the fail-fast channel
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    #[default]
    #[error("operation unsuccessful")]
    Unsuccessful,
    #[error("insufficient resources")]
    InsufficientResources,
    #[error("invalid device state")]
    InvalidDeviceState,
    #[error("device not ready")]
    DeviceNotReady,
    #[error("device busy")]
    DeviceBusy,
    #[error("not supported")]
    NotSupported,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("cancelled")]
    Cancelled,
}

/// Result of a status-returning handler
pub type Status = Result<(), StatusCode>;
