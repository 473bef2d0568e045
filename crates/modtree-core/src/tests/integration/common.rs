#![cfg(test)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::component::descriptor::{Descriptor, OpenPolicy};
use crate::component::{ComponentView, LifecycleHandlers, LifecycleState};
use crate::config::EngineConfig;
use crate::dispatch::params::{
    DeviceHandle, DevicePowerState, FileHandle, QueueHandle, RelationType, RequestHandle,
    ResourceList, SpecialFileType,
};
use crate::dispatch::{Dispatcher, EventKind, Status, StatusCode};
use crate::tree::{ComponentId, ComponentSpec, ComponentTree};

// ===== JOURNAL =====

/// Ordered record of `(label, component)` pairs shared by every probe
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<(String, String)>>>);

impl Journal {
    pub fn record(&self, label: &str, component: &str) {
        self.0.lock().unwrap().push((label.to_string(), component.to_string()));
    }

    /// Components visited for `label`, in visit order
    pub fn visits(&self, label: &str) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| l == label)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

// ===== RECORDING HANDLERS =====

#[derive(Default)]
struct Rules {
    fail_on: HashMap<(String, EventKind), StatusCode>,
    handles: HashSet<(String, EventKind)>,
    fail_open: HashSet<String>,
}

/// Handler table that journals every call and answers from [`Rules`]
struct Recording {
    journal: Journal,
    rules: Arc<Rules>,
}

impl Recording {
    fn status(&self, c: &ComponentView<'_>, event: EventKind) -> Status {
        self.journal.record(event.name(), c.name());
        match self.rules.fail_on.get(&(c.name().to_string(), event)) {
            Some(status) => Err(*status),
            None => Ok(()),
        }
    }

    fn handled(&self, c: &ComponentView<'_>, event: EventKind) -> bool {
        self.journal.record(event.name(), c.name());
        self.rules.handles.contains(&(c.name().to_string(), event))
    }

    fn note(&self, c: &ComponentView<'_>, event: EventKind) {
        self.journal.record(event.name(), c.name());
    }
}

impl LifecycleHandlers for Recording {
    fn open(&self, c: &ComponentView<'_>) -> Status {
        self.journal.record("open", c.name());
        if self.rules.fail_open.contains(c.name()) {
            return Err(StatusCode::InsufficientResources);
        }
        Ok(())
    }

    fn close(&self, c: &ComponentView<'_>) {
        self.journal.record("close", c.name());
    }

    fn resources_assign(&self, c: &ComponentView<'_>, _raw: ResourceList, _translated: ResourceList) -> Status {
        crate::component::defaults::validate_resources_assign(c)?;
        self.status(c, EventKind::ResourcesAssign)
    }

    fn prepare_hardware(&self, c: &ComponentView<'_>, _raw: ResourceList, _translated: ResourceList) -> Status {
        self.status(c, EventKind::PrepareHardware)
    }

    fn release_hardware(&self, c: &ComponentView<'_>, _translated: ResourceList) -> Status {
        self.status(c, EventKind::ReleaseHardware)
    }

    fn notification_register(&self, c: &ComponentView<'_>) -> Status {
        self.status(c, EventKind::NotificationRegister)
    }

    fn notification_unregister(&self, c: &ComponentView<'_>) -> Status {
        self.status(c, EventKind::NotificationUnregister)
    }

    fn d0_entry(&self, c: &ComponentView<'_>, _previous: DevicePowerState) -> Status {
        self.status(c, EventKind::D0Entry)
    }

    fn d0_entry_post_interrupts_enabled(&self, c: &ComponentView<'_>, _previous: DevicePowerState) -> Status {
        self.status(c, EventKind::D0EntryPostInterruptsEnabled)
    }

    fn d0_exit(&self, c: &ComponentView<'_>, _target: DevicePowerState) -> Status {
        self.status(c, EventKind::D0Exit)
    }

    fn d0_exit_pre_interrupts_disabled(&self, c: &ComponentView<'_>, _target: DevicePowerState) -> Status {
        self.status(c, EventKind::D0ExitPreInterruptsDisabled)
    }

    fn self_managed_io_init(&self, c: &ComponentView<'_>) -> Status {
        self.status(c, EventKind::SelfManagedIoInit)
    }

    fn self_managed_io_restart(&self, c: &ComponentView<'_>) -> Status {
        self.status(c, EventKind::SelfManagedIoRestart)
    }

    fn self_managed_io_suspend(&self, c: &ComponentView<'_>) -> Status {
        self.status(c, EventKind::SelfManagedIoSuspend)
    }

    fn self_managed_io_cleanup(&self, c: &ComponentView<'_>) {
        self.note(c, EventKind::SelfManagedIoCleanup)
    }

    fn self_managed_io_flush(&self, c: &ComponentView<'_>) {
        self.note(c, EventKind::SelfManagedIoFlush)
    }

    fn queue_read(&self, c: &ComponentView<'_>, _q: QueueHandle, _r: RequestHandle, _len: usize) -> bool {
        self.handled(c, EventKind::QueueRead)
    }

    fn queue_write(&self, c: &ComponentView<'_>, _q: QueueHandle, _r: RequestHandle, _len: usize) -> bool {
        self.handled(c, EventKind::QueueWrite)
    }

    fn queue_device_io_control(
        &self,
        c: &ComponentView<'_>,
        _q: QueueHandle,
        _r: RequestHandle,
        _out: usize,
        _in: usize,
        _code: u32,
    ) -> bool {
        self.handled(c, EventKind::QueueDeviceIoControl)
    }

    fn queue_internal_device_io_control(
        &self,
        c: &ComponentView<'_>,
        _q: QueueHandle,
        _r: RequestHandle,
        _out: usize,
        _in: usize,
        _code: u32,
    ) -> bool {
        self.handled(c, EventKind::QueueInternalDeviceIoControl)
    }

    fn file_create(&self, c: &ComponentView<'_>, _d: DeviceHandle, _r: RequestHandle, _f: FileHandle) -> bool {
        self.handled(c, EventKind::FileCreate)
    }

    fn file_cleanup(&self, c: &ComponentView<'_>, _f: FileHandle) -> bool {
        self.handled(c, EventKind::FileCleanup)
    }

    fn file_close(&self, c: &ComponentView<'_>, _f: FileHandle) -> bool {
        self.handled(c, EventKind::FileClose)
    }

    fn query_remove(&self, c: &ComponentView<'_>) -> Status {
        self.status(c, EventKind::QueryRemove)
    }

    fn query_stop(&self, c: &ComponentView<'_>) -> Status {
        self.status(c, EventKind::QueryStop)
    }

    fn surprise_removal(&self, c: &ComponentView<'_>) {
        self.note(c, EventKind::SurpriseRemoval)
    }

    fn relations_query(&self, c: &ComponentView<'_>, _relation: RelationType) {
        self.note(c, EventKind::RelationsQuery)
    }

    fn usage_notification(&self, c: &ComponentView<'_>, _t: SpecialFileType, _in_path: bool) -> Status {
        self.status(c, EventKind::UsageNotification)
    }

    fn arm_wake_from_s0(&self, c: &ComponentView<'_>) -> Status {
        self.status(c, EventKind::ArmWakeFromS0)
    }

    fn arm_wake_from_sx(&self, c: &ComponentView<'_>, _enabled: bool, _children: bool) -> Status {
        self.status(c, EventKind::ArmWakeFromSx)
    }

    fn disarm_wake_from_s0(&self, c: &ComponentView<'_>) {
        self.note(c, EventKind::DisarmWakeFromS0)
    }

    fn disarm_wake_from_sx(&self, c: &ComponentView<'_>) {
        self.note(c, EventKind::DisarmWakeFromSx)
    }

    fn wake_from_s0_triggered(&self, c: &ComponentView<'_>) {
        self.note(c, EventKind::WakeFromS0Triggered)
    }

    fn wake_from_sx_triggered(&self, c: &ComponentView<'_>) {
        self.note(c, EventKind::WakeFromSxTriggered)
    }
}

// ===== FIXTURE =====

struct NodeDef {
    name: String,
    parent: Option<String>,
    policy: OpenPolicy,
}

/// Declarative tree of recording components
#[derive(Default)]
pub struct FixtureBuilder {
    config: EngineConfig,
    nodes: Vec<NodeDef>,
    rules: Rules,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn root(mut self, name: &str) -> Self {
        self.nodes.push(NodeDef {
            name: name.to_string(),
            parent: None,
            policy: OpenPolicy::Manual,
        });
        self
    }

    /// Add `name` as the last child of an already-declared `parent`
    pub fn child(mut self, parent: &str, name: &str) -> Self {
        self.nodes.push(NodeDef {
            name: name.to_string(),
            parent: Some(parent.to_string()),
            policy: OpenPolicy::Manual,
        });
        self
    }

    pub fn policy(mut self, name: &str, policy: OpenPolicy) -> Self {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.name == name)
            .expect("policy for undeclared node");
        node.policy = policy;
        self
    }

    pub fn fail(mut self, name: &str, event: EventKind, status: StatusCode) -> Self {
        self.rules.fail_on.insert((name.to_string(), event), status);
        self
    }

    pub fn handles(mut self, name: &str, event: EventKind) -> Self {
        self.rules.handles.insert((name.to_string(), event));
        self
    }

    pub fn fail_open(mut self, name: &str) -> Self {
        self.rules.fail_open.insert(name.to_string());
        self
    }

    pub fn build(self) -> Fixture {
        let journal = Journal::default();
        let rules = Arc::new(self.rules);
        let mut builder = ComponentTree::builder(self.config);
        let mut ids: HashMap<String, ComponentId> = HashMap::new();

        for node in self.nodes {
            let descriptor = Descriptor::builder(
                format!("recording-{}", node.name),
                Recording {
                    journal: journal.clone(),
                    rules: rules.clone(),
                },
            )
            .open_policy(node.policy)
            .build()
            .expect("valid descriptor");
            let spec = ComponentSpec::new(node.name.clone(), descriptor);
            let id = match &node.parent {
                Some(parent) => builder
                    .add_child(ids[parent], spec)
                    .expect("child of declared parent"),
                None => builder.add_root(spec).expect("root"),
            };
            ids.insert(node.name, id);
        }

        let tree = builder.build();
        Fixture {
            dispatcher: Dispatcher::new(tree.clone()),
            tree,
            journal,
            ids,
        }
    }
}

pub struct Fixture {
    pub tree: Arc<ComponentTree>,
    pub dispatcher: Dispatcher,
    pub journal: Journal,
    ids: HashMap<String, ComponentId>,
}

impl Fixture {
    pub fn id(&self, name: &str) -> ComponentId {
        self.ids[name]
    }

    pub fn view(&self, name: &str) -> ComponentView<'_> {
        self.tree.view(self.id(name))
    }

    pub fn state(&self, name: &str) -> LifecycleState {
        self.view(name).state()
    }
}

/// `P` with children `A`, `B`, `C`
pub fn parent_with_three_children() -> FixtureBuilder {
    FixtureBuilder::new()
        .root("P")
        .child("P", "A")
        .child("P", "B")
        .child("P", "C")
}
