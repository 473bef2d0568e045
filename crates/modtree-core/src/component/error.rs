use thiserror::Error;

use crate::component::LifecycleState;
use crate::tree::ComponentId;

/// Recoverable component-level errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("Component '{component}' is not available (state: {state}, or close pending)")]
    NotAvailable { component: String, state: LifecycleState },

    #[error("Invalid descriptor '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    #[error("Component {component} has {count} auxiliary locks, index {index} is out of range")]
    AuxiliaryLockOutOfRange {
        component: ComponentId,
        index: usize,
        count: usize,
    },
}
