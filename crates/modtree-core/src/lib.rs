//! # Modtree Core
//!
//! Component composition and lifecycle dispatch for device drivers built
//! from many independently authored components.
//!
//! A device is a [`ComponentTree`]: a root collection whose members own
//! ordered children, recursively. The host runtime delivers each lifecycle
//! event once to a [`Dispatcher`] (or through a [`DeviceHost`]), which
//! fans it out across the tree in the event's order and direction and
//! aggregates the per-component results. Each component carries its own
//! open/close state machine and a reference-counted rundown that lets
//! in-flight method calls finish before it is torn down.
//!
//! ```text
//! host event -> Dispatcher -> walk (fail-fast | until-handled | fan-out)
//!                                  -> LifecycleHandlers of each component
//!                                  -> open-policy checkpoints (open/close)
//! ```
pub mod component;
pub mod config;
pub mod dispatch;
pub mod kernel;
pub mod tree;

pub use component::{
    ClientNotifications, Component, ComponentView, Descriptor, ExecutionCeiling, LifecycleHandlers,
    LifecycleState, OpenPolicy, ReferenceGuard,
};
pub use config::{ConfigFormat, EngineConfig};
pub use dispatch::{DispatchError, DispatchOutcome, Dispatcher, EventKind, HostEvent, Status, StatusCode};
pub use kernel::error::Error as KernelError;
pub use kernel::{DeviceHost, HostState};
pub use tree::{ComponentId, ComponentSpec, ComponentTree, TreeBuilder};

#[cfg(test)]
mod tests;
