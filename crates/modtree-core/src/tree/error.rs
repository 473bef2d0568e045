use thiserror::Error;

use crate::tree::ComponentId;

/// Errors raised while building or addressing a component tree
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Component {0} does not belong to this tree")]
    UnknownComponent(ComponentId),

    #[error("Cannot add child '{child}': parent {parent} does not exist")]
    UnknownParent { parent: ComponentId, child: String },

    #[error("Component name must not be empty")]
    EmptyName,

    #[error("Component '{component}' would exceed the maximum tree depth of {max_depth}")]
    DepthExceeded { component: String, max_depth: usize },
}
