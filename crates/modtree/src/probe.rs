//! Probe components used by `modtree run`.
//!
//! A probe records every handler call into a shared [`Trace`] and answers
//! according to the rules its script node declares.
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use modtree_core::dispatch::params::{
    DeviceHandle, DevicePowerState, FileHandle, QueueHandle, RelationType, RequestHandle,
    ResourceList, SpecialFileType,
};
use modtree_core::{ComponentView, EventKind, LifecycleHandlers, Status, StatusCode};

/// Handler calls in the order they happened, as `(label, component)`
#[derive(Debug, Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<(String, String)>>>);

impl Trace {
    pub fn record(&self, label: &str, component: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((label.to_string(), component.to_string()));
    }

    /// Drain the trace, grouping consecutive calls with the same label
    pub fn take_grouped(&self) -> Vec<(String, Vec<String>)> {
        let entries = std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner));
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for (label, component) in entries {
            if let Some((last, components)) = grouped.last_mut() {
                if *last == label {
                    components.push(component);
                    continue;
                }
            }
            grouped.push((label, vec![component]));
        }
        grouped
    }
}

#[derive(Debug, Default, Clone)]
pub struct ProbeRules {
    pub fail_on: HashSet<EventKind>,
    pub fail_with: StatusCode,
    pub handles: HashSet<EventKind>,
    pub fail_open: bool,
}

pub struct ProbeHandlers {
    trace: Trace,
    rules: ProbeRules,
}

impl ProbeHandlers {
    pub fn new(trace: Trace, rules: ProbeRules) -> Self {
        Self { trace, rules }
    }

    fn status(&self, c: &ComponentView<'_>, event: EventKind) -> Status {
        self.trace.record(event.name(), c.name());
        if self.rules.fail_on.contains(&event) {
            return Err(self.rules.fail_with);
        }
        Ok(())
    }

    fn handled(&self, c: &ComponentView<'_>, event: EventKind) -> bool {
        self.trace.record(event.name(), c.name());
        self.rules.handles.contains(&event)
    }

    fn note(&self, c: &ComponentView<'_>, event: EventKind) {
        self.trace.record(event.name(), c.name());
    }
}

impl LifecycleHandlers for ProbeHandlers {
    fn open(&self, c: &ComponentView<'_>) -> Status {
        self.trace.record("open", c.name());
        if self.rules.fail_open {
            return Err(self.rules.fail_with);
        }
        Ok(())
    }

    fn close(&self, c: &ComponentView<'_>) {
        self.trace.record("close", c.name());
    }

    fn resources_assign(&self, c: &ComponentView<'_>, _raw: ResourceList, _translated: ResourceList) -> Status {
        modtree_core::component::defaults::validate_resources_assign(c)?;
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

    fn queue_read(&self, c: &ComponentView<'_>, _queue: QueueHandle, _request: RequestHandle, _length: usize) -> bool {
        self.handled(c, EventKind::QueueRead)
    }

    fn queue_write(&self, c: &ComponentView<'_>, _queue: QueueHandle, _request: RequestHandle, _length: usize) -> bool {
        self.handled(c, EventKind::QueueWrite)
    }

    fn queue_device_io_control(
        &self,
        c: &ComponentView<'_>,
        _queue: QueueHandle,
        _request: RequestHandle,
        _output_length: usize,
        _input_length: usize,
        _code: u32,
    ) -> bool {
        self.handled(c, EventKind::QueueDeviceIoControl)
    }

    fn queue_internal_device_io_control(
        &self,
        c: &ComponentView<'_>,
        _queue: QueueHandle,
        _request: RequestHandle,
        _output_length: usize,
        _input_length: usize,
        _code: u32,
    ) -> bool {
        self.handled(c, EventKind::QueueInternalDeviceIoControl)
    }

    fn file_create(&self, c: &ComponentView<'_>, _device: DeviceHandle, _request: RequestHandle, _file: FileHandle) -> bool {
        self.handled(c, EventKind::FileCreate)
    }

    fn file_cleanup(&self, c: &ComponentView<'_>, _file: FileHandle) -> bool {
        self.handled(c, EventKind::FileCleanup)
    }

    fn file_close(&self, c: &ComponentView<'_>, _file: FileHandle) -> bool {
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

    fn usage_notification(&self, c: &ComponentView<'_>, _file_type: SpecialFileType, _in_path: bool) -> Status {
        self.status(c, EventKind::UsageNotification)
    }

    fn arm_wake_from_s0(&self, c: &ComponentView<'_>) -> Status {
        self.status(c, EventKind::ArmWakeFromS0)
    }

    fn arm_wake_from_sx(&self, c: &ComponentView<'_>, _device_wake_enabled: bool, _children_armed: bool) -> Status {
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
