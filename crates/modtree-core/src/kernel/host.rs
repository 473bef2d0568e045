//! # Device Host
//!
//! [`DeviceHost`] is the boundary a host runtime talks to. It owns one
//! built component tree and forwards the device's lifecycle to the
//! [`Dispatcher`]: notification registration at create, every later event
//! exactly once, and an orderly teardown at destroy.
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::component::LifecycleState;
use crate::dispatch::event::{Aggregation, HostEvent, Order, Traversal};
use crate::dispatch::walk::fan_out;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::kernel::constants;
use crate::kernel::error::{Error, HostPhase, Result};
use crate::tree::{ComponentTree, Direction};

/// Where a [`DeviceHost`] is in its own lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Built,
    Created,
    Destroyed,
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostState::Built => write!(f, "built"),
            HostState::Created => write!(f, "created"),
            HostState::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// Teardown walk closing whatever is still open, parents before children
const TEARDOWN: Traversal = Traversal::new(Order::ParentFirst, Direction::Backward, Aggregation::Unconditional);

pub struct DeviceHost {
    dispatcher: Dispatcher,
    state: Mutex<HostState>,
}

impl DeviceHost {
    pub fn new(tree: Arc<ComponentTree>) -> Self {
        Self {
            dispatcher: Dispatcher::new(tree),
            state: Mutex::new(HostState::Built),
        }
    }

    pub fn tree(&self) -> &Arc<ComponentTree> {
        self.dispatcher.tree()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn lock_state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> HostState {
        *self.lock_state()
    }

    fn expect_state(&self, phase: HostPhase, expected: HostState) -> Result<()> {
        let state = self.state();
        if state != expected {
            return Err(Error::host(
                phase,
                format!("device host is {}, expected {}", state, expected),
            ));
        }
        Ok(())
    }

    /// Register every notify-on-create component.
    pub fn create(&self) -> Result<()> {
        self.expect_state(HostPhase::Create, HostState::Built)?;
        log::info!(
            "Creating {} {} device host over {} components",
            constants::ENGINE_NAME,
            constants::ENGINE_VERSION,
            self.tree().len()
        );

        self.dispatcher
            .notification_register()
            .map_err(|err| Error::HostLifecycle {
                phase: HostPhase::Create,
                message: "notification registration failed".to_string(),
                source: Some(Box::new(Error::Dispatch(err))),
            })?;

        *self.lock_state() = HostState::Created;
        Ok(())
    }

    /// Deliver one host event.
    ///
    /// Prepare-hardware is preceded by the auxiliary resource-assign walk;
    /// when that fails, prepare-hardware is not dispatched.
    pub fn deliver(&self, event: &HostEvent) -> Result<DispatchOutcome> {
        self.expect_state(HostPhase::Deliver, HostState::Created)?;

        if let HostEvent::PrepareHardware { raw, translated } = *event {
            if let Err(err) = self.dispatcher.resources_assign(raw, translated) {
                return Ok(DispatchOutcome::Failed(err));
            }
        }
        let outcome = self.dispatcher.deliver(event);
        log::debug!("{} -> {}", event.kind(), outcome);
        Ok(outcome)
    }

    /// Unregister notifications, close every component still open and
    /// check that the whole tree may be released.
    pub fn destroy(&self) -> Result<()> {
        let state = self.state();
        if state == HostState::Destroyed {
            return Err(Error::host(HostPhase::Destroy, "device host already destroyed"));
        }
        log::info!("Destroying device host");

        if state == HostState::Created {
            self.dispatcher.notification_unregister();
        }

        let tree = self.tree();
        fan_out(tree, TEARDOWN, "destroy", |c| {
            // A close already under way elsewhere is waited for, not skipped.
            if matches!(c.state(), LifecycleState::Opened | LifecycleState::Closing) {
                log::debug!("Closing '{}' at teardown", c.name());
                c.close();
            }
            Ok(())
        });

        let lingering: Vec<String> = tree
            .ids()
            .map(|id| tree.view(id))
            .filter(|c| !c.is_deletable())
            .map(|c| format!("{} ({})", c.name(), c.state()))
            .collect();

        *self.lock_state() = HostState::Destroyed;
        if !lingering.is_empty() {
            return Err(Error::host(
                HostPhase::Destroy,
                format!("components not deletable after teardown: {}", lingering.join(", ")),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for DeviceHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceHost")
            .field("state", &self.state())
            .field("components", &self.tree().len())
            .finish()
    }
}
