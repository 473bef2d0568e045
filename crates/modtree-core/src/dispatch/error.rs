use thiserror::Error;

use crate::dispatch::event::EventKind;
use crate::dispatch::status::StatusCode;
use crate::tree::ComponentId;

/// A fail-fast walk aborted on a handler failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("{event} failed in component '{component}' ({component_id}): {status}")]
    HandlerFailed {
        event: EventKind,
        component: String,
        component_id: ComponentId,
        status: StatusCode,
    },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::HandlerFailed { status, .. } => *status,
        }
    }

    pub fn component(&self) -> ComponentId {
        match self {
            DispatchError::HandlerFailed { component_id, .. } => *component_id,
        }
    }

    pub fn event(&self) -> EventKind {
        match self {
            DispatchError::HandlerFailed { event, .. } => *event,
        }
    }
}
