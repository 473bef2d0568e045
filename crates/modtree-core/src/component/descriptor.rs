//! Per-type component descriptors.
//!
//! A [`Descriptor`] is the authoring contract of a component type: its
//! name, when it auto-opens, which lock primitive it uses, how many
//! auxiliary locks each instance gets and the handler table. One
//! descriptor is shared by every instance of the type.
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::component::error::ComponentError;
use crate::component::handlers::LifecycleHandlers;
use crate::component::lock::LockKind;
use crate::kernel::constants::MAX_AUXILIARY_LOCKS;

/// Dispatch points where an [`OpenPolicy`] may act
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    /// Notification register at host create / notification unregister
    Create,
    /// Hardware resources assigned (prepare hardware) / released
    ResourceAssign,
    /// D0 entry / D0 exit
    PowerEntry,
}

/// What a policy does at its checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    Open,
    NotifyRegister,
}

/// When a component opens (or registers for notifications) by itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenPolicy {
    /// Opened and closed only by explicit calls
    #[default]
    Manual,
    OpenOnResourceAssign,
    NotifyOnResourceAssign,
    OpenOnPowerEntry,
    NotifyOnPowerEntry,
    NotifyOnCreate,
}

impl OpenPolicy {
    /// Checkpoint at which this policy acts, `None` for manual components
    pub fn checkpoint(self) -> Option<Checkpoint> {
        match self {
            OpenPolicy::Manual => None,
            OpenPolicy::OpenOnResourceAssign | OpenPolicy::NotifyOnResourceAssign => {
                Some(Checkpoint::ResourceAssign)
            }
            OpenPolicy::OpenOnPowerEntry | OpenPolicy::NotifyOnPowerEntry => Some(Checkpoint::PowerEntry),
            OpenPolicy::NotifyOnCreate => Some(Checkpoint::Create),
        }
    }

    pub fn action(self) -> Option<PolicyAction> {
        match self {
            OpenPolicy::Manual => None,
            OpenPolicy::OpenOnResourceAssign | OpenPolicy::OpenOnPowerEntry => Some(PolicyAction::Open),
            _ => Some(PolicyAction::NotifyRegister),
        }
    }

    pub fn is_notify(self) -> bool {
        self.action() == Some(PolicyAction::NotifyRegister)
    }
}

/// Highest execution level the component's callbacks run at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionCeiling {
    /// May block; uses blocking locks
    #[default]
    Passive,
    /// Must not block; uses spin locks
    Dispatch,
}

impl ExecutionCeiling {
    pub fn lock_kind(self) -> LockKind {
        match self {
            ExecutionCeiling::Passive => LockKind::Blocking,
            ExecutionCeiling::Dispatch => LockKind::Spin,
        }
    }
}

pub struct Descriptor {
    name: String,
    open_policy: OpenPolicy,
    ceiling: ExecutionCeiling,
    auxiliary_locks: usize,
    handlers: Arc<dyn LifecycleHandlers>,
}

impl Descriptor {
    pub fn builder(name: impl Into<String>, handlers: impl LifecycleHandlers + 'static) -> DescriptorBuilder {
        DescriptorBuilder {
            name: name.into(),
            open_policy: OpenPolicy::default(),
            ceiling: ExecutionCeiling::default(),
            auxiliary_locks: 0,
            handlers: Arc::new(handlers),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn open_policy(&self) -> OpenPolicy {
        self.open_policy
    }

    pub fn ceiling(&self) -> ExecutionCeiling {
        self.ceiling
    }

    pub fn auxiliary_locks(&self) -> usize {
        self.auxiliary_locks
    }

    pub fn handlers(&self) -> &dyn LifecycleHandlers {
        self.handlers.as_ref()
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("open_policy", &self.open_policy)
            .field("ceiling", &self.ceiling)
            .field("auxiliary_locks", &self.auxiliary_locks)
            .finish()
    }
}

/// Builder for [`Descriptor`]
pub struct DescriptorBuilder {
    name: String,
    open_policy: OpenPolicy,
    ceiling: ExecutionCeiling,
    auxiliary_locks: usize,
    handlers: Arc<dyn LifecycleHandlers>,
}

impl DescriptorBuilder {
    pub fn open_policy(mut self, policy: OpenPolicy) -> Self {
        self.open_policy = policy;
        self
    }

    pub fn ceiling(mut self, ceiling: ExecutionCeiling) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn auxiliary_locks(mut self, count: usize) -> Self {
        self.auxiliary_locks = count;
        self
    }

    pub fn build(self) -> Result<Arc<Descriptor>, ComponentError> {
        if self.name.trim().is_empty() {
            return Err(ComponentError::InvalidDescriptor {
                name: self.name,
                reason: "descriptor name must not be empty".to_string(),
            });
        }
        if self.auxiliary_locks > MAX_AUXILIARY_LOCKS {
            return Err(ComponentError::InvalidDescriptor {
                reason: format!(
                    "{} auxiliary locks requested, at most {} allowed",
                    self.auxiliary_locks, MAX_AUXILIARY_LOCKS
                ),
                name: self.name,
            });
        }
        Ok(Arc::new(Descriptor {
            name: self.name,
            open_policy: self.open_policy,
            ceiling: self.ceiling,
            auxiliary_locks: self.auxiliary_locks,
            handlers: self.handlers,
        }))
    }
}
