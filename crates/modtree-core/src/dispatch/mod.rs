//! # Modtree Dispatch Engine
//!
//! Receives every lifecycle event exactly once and fans it out over a
//! [`ComponentTree`](crate::tree::ComponentTree), visiting each node's
//! handler in the event's order and direction and combining the results
//! with the event's aggregation policy:
//!
//! - **fail-fast**: the first failure aborts the walk and is returned
//!   as a [`DispatchError`] naming the event and component; there is no
//!   partial undo.
//! - **or-until-handled**: the first node returning `true` stops the walk;
//!   parents are asked before their children.
//! - **unconditional**: every node is visited, failures are logged and
//!   discarded.
//!
//! Open-policy checkpoints ride along: entry events open (or register)
//! a component after its handler succeeded, exit events close (or
//! unregister) it before its handler runs.
pub mod engine;
pub mod error;
pub mod event;
pub mod params;
pub mod status;
pub(crate) mod walk;

pub use engine::{DispatchOutcome, Dispatcher};
pub use error::DispatchError;
pub use event::{Aggregation, EventKind, HostEvent, Order, Traversal};
pub use status::{Status, StatusCode};
