//! # Modtree Components
//!
//! A component is one node of a [`ComponentTree`](crate::tree::ComponentTree):
//! a named instance of a [`Descriptor`] with its own lifecycle state,
//! reference count, locks and private context.
//!
//! ## Key Components
//!
//! - **`Descriptor`** / **`LifecycleHandlers`**: the per-type authoring
//!   contract and its handler table with default bodies.
//! - **`lifecycle`**: the `Created -> Opening -> Opened -> Closing -> Closed`
//!   state machine and open-policy checkpoints (`defaults`).
//! - **`rundown`**: "acquire iff open and not draining" plus the drain wait
//!   a close performs before it tears the component down.
//! - **`lock`**: blocking or spin locks selected by the execution ceiling.
//! - **`ComponentView`**: a component together with the tree it lives in;
//!   the handle every handler and method receives.
pub mod defaults;
pub mod descriptor;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod lock;
pub mod rundown;

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::component::descriptor::Checkpoint;
use crate::component::error::ComponentError;
use crate::component::lifecycle::LifecycleCell;
use crate::component::lock::{ComponentLock, LockGuard, new_lock};
use crate::component::rundown::{Rundown, RundownWait};
use crate::dispatch::status::Status;
use crate::tree::{ComponentId, ComponentTree, TreeLinks};

pub use descriptor::{Descriptor, DescriptorBuilder, ExecutionCeiling, OpenPolicy};
pub use handlers::LifecycleHandlers;
pub use lifecycle::LifecycleState;

/// Callback attached by the code that instantiated a component
pub type ClientCallback = Arc<dyn Fn(&ComponentView<'_>) + Send + Sync>;

/// Client post-open / pre-close notifications for one instance
#[derive(Clone, Default)]
pub struct ClientNotifications {
    post_open: Option<ClientCallback>,
    pre_close: Option<ClientCallback>,
}

impl ClientNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_post_open<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ComponentView<'_>) + Send + Sync + 'static,
    {
        self.post_open = Some(Arc::new(callback));
        self
    }

    pub fn on_pre_close<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ComponentView<'_>) + Send + Sync + 'static,
    {
        self.pre_close = Some(Arc::new(callback));
        self
    }

    pub(crate) fn fire_post_open(&self, component: &ComponentView<'_>) {
        if let Some(callback) = &self.post_open {
            callback(component);
        }
    }

    pub(crate) fn fire_pre_close(&self, component: &ComponentView<'_>) {
        if let Some(callback) = &self.pre_close {
            callback(component);
        }
    }
}

impl fmt::Debug for ClientNotifications {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientNotifications")
            .field("post_open", &self.post_open.is_some())
            .field("pre_close", &self.pre_close.is_some())
            .finish()
    }
}

/// One node of a component tree
pub struct Component {
    id: ComponentId,
    name: String,
    descriptor: Arc<Descriptor>,
    pub(crate) links: TreeLinks,
    children: Vec<ComponentId>,
    lifecycle: Mutex<LifecycleCell>,
    /// Signalled whenever a claimed close finishes or is abandoned
    pub(crate) close_done: Condvar,
    pub(crate) close_done_async: Notify,
    pub(crate) rundown: Rundown,
    default_lock: Box<dyn ComponentLock>,
    auxiliary_locks: Vec<Box<dyn ComponentLock>>,
    context: Option<Box<dyn Any + Send + Sync>>,
    pub(crate) notifications: ClientNotifications,
    pub(crate) deletable: AtomicBool,
}

impl Component {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: ComponentId,
        name: String,
        descriptor: Arc<Descriptor>,
        links: TreeLinks,
        children: Vec<ComponentId>,
        wait: RundownWait,
        context: Option<Box<dyn Any + Send + Sync>>,
        notifications: ClientNotifications,
    ) -> Self {
        let kind = descriptor.ceiling().lock_kind();
        let auxiliary_locks = (0..descriptor.auxiliary_locks()).map(|_| new_lock(kind)).collect();
        Self {
            id,
            name,
            links,
            children,
            lifecycle: Mutex::new(LifecycleCell::default()),
            close_done: Condvar::new(),
            close_done_async: Notify::new(),
            rundown: Rundown::new(wait),
            default_lock: new_lock(kind),
            auxiliary_locks,
            context,
            notifications,
            deletable: AtomicBool::new(true), // never-opened components may be destroyed
            descriptor,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &Arc<Descriptor> {
        &self.descriptor
    }

    pub fn parent(&self) -> Option<ComponentId> {
        self.links.parent
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    pub(crate) fn lifecycle(&self) -> MutexGuard<'_, LifecycleCell> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle().state
    }

    pub fn reference_count(&self) -> u32 {
        self.rundown.reference_count()
    }

    pub fn is_close_pending(&self) -> bool {
        self.rundown.is_close_pending()
    }

    /// Set after a failed open or a completed close, cleared by an open
    pub fn is_deletable(&self) -> bool {
        self.deletable.load(Ordering::SeqCst)
    }

    pub fn context<T: Any>(&self) -> Option<&T> {
        self.context.as_ref().and_then(|ctx| ctx.downcast_ref::<T>())
    }

    pub(crate) fn record_checkpoint(&self, checkpoint: Checkpoint) {
        self.lifecycle().checkpoint = Some(checkpoint);
    }

    /// Forget `checkpoint` if it is the one recorded; `true` if it was
    pub(crate) fn take_checkpoint(&self, checkpoint: Checkpoint) -> bool {
        let mut cell = self.lifecycle();
        if cell.checkpoint == Some(checkpoint) {
            cell.checkpoint = None;
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("descriptor", &self.descriptor.name())
            .field("state", &self.state())
            .field("rundown", &self.rundown)
            .field("children", &self.children)
            .finish()
    }
}

/// A component together with the tree it belongs to
#[derive(Clone, Copy)]
pub struct ComponentView<'a> {
    tree: &'a ComponentTree,
    component: &'a Component,
}

impl<'a> ComponentView<'a> {
    pub(crate) fn new(tree: &'a ComponentTree, component: &'a Component) -> Self {
        Self { tree, component }
    }

    pub fn tree(&self) -> &'a ComponentTree {
        self.tree
    }

    pub fn component(&self) -> &'a Component {
        self.component
    }

    pub fn id(&self) -> ComponentId {
        self.component.id
    }

    pub fn name(&self) -> &'a str {
        &self.component.name
    }

    pub fn state(&self) -> LifecycleState {
        self.component.state()
    }

    pub fn descriptor(&self) -> &'a Descriptor {
        &self.component.descriptor
    }

    pub fn handlers(&self) -> &'a dyn LifecycleHandlers {
        self.component.descriptor.handlers()
    }

    pub fn parent(&self) -> Option<ComponentView<'a>> {
        let tree = self.tree;
        self.component.links.parent.map(|id| tree.view(id))
    }

    pub fn children(&self) -> impl Iterator<Item = ComponentView<'a>> + use<'a> {
        let tree = self.tree;
        self.component.children.iter().map(move |id| tree.view(*id))
    }

    pub fn context<T: Any>(&self) -> Option<&'a T> {
        self.component.context::<T>()
    }

    pub fn reference_count(&self) -> u32 {
        self.component.reference_count()
    }

    pub fn is_close_pending(&self) -> bool {
        self.component.is_close_pending()
    }

    pub fn is_deletable(&self) -> bool {
        self.component.is_deletable()
    }

    /// Acquire the component's default lock
    pub fn lock(&self) -> LockGuard<'a> {
        self.component.default_lock.acquire()
    }

    pub fn auxiliary_lock(&self, index: usize) -> Result<LockGuard<'a>, ComponentError> {
        let component = self.component;
        component
            .auxiliary_locks
            .get(index)
            .map(|lock| lock.acquire())
            .ok_or(ComponentError::AuxiliaryLockOutOfRange {
                component: component.id,
                index,
                count: component.auxiliary_locks.len(),
            })
    }

    /// Take a reference for the duration of a method call.
    ///
    /// Fails with `NotAvailable` unless the component is open and no close
    /// is pending. Every success must be paired with [`release`](Self::release).
    pub fn acquire(&self) -> Result<(), ComponentError> {
        if self.component.rundown.acquire() {
            return Ok(());
        }
        let state = self.state();
        log::warn!(
            "Component '{}' refused a reference (state: {}, close pending: {})",
            self.name(),
            state,
            self.is_close_pending()
        );
        Err(ComponentError::NotAvailable {
            component: self.component.name.clone(),
            state,
        })
    }

    pub fn release(&self) {
        self.component.rundown.release();
    }

    /// [`acquire`](Self::acquire) with a guard that releases on drop
    pub fn reference(&self) -> Result<ReferenceGuard<'a>, ComponentError> {
        self.acquire()?;
        Ok(ReferenceGuard { component: *self })
    }

    pub fn open(&self) -> Status {
        lifecycle::open(self)
    }

    pub fn close(&self) {
        lifecycle::close(self)
    }

    pub async fn close_async(&self) {
        lifecycle::close_async(self).await
    }
}

impl fmt::Debug for ComponentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentView")
            .field("id", &self.component.id)
            .field("name", &self.component.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Outstanding reference on a component, released on drop
pub struct ReferenceGuard<'a> {
    component: ComponentView<'a>,
}

impl<'a> ReferenceGuard<'a> {
    pub fn component(&self) -> ComponentView<'a> {
        self.component
    }
}

impl Drop for ReferenceGuard<'_> {
    fn drop(&mut self) {
        self.component.release();
    }
}

impl fmt::Debug for ReferenceGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReferenceGuard").field(&self.component.name()).finish()
    }
}

/// Report a broken engine invariant and abort the current thread.
#[track_caller]
pub fn invariant_violation(component: &ComponentView<'_>, message: &str) -> ! {
    log::error!(
        "Invariant violation in component '{}' ({}): {}",
        component.name(),
        component.id(),
        message
    );
    panic!(
        "invariant violation in component '{}' ({}): {}",
        component.name(),
        component.id(),
        message
    )
}
