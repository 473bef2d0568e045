//! The per-type handler table.
//!
//! Every lifecycle event the host can deliver maps to one method of
//! [`LifecycleHandlers`]. A component type overrides the events it cares
//! about; the default bodies are the shared default handlers (validation
//! no-ops, "must be overridden" assertions and plain no-ops). Open and
//! close have no usable default.
use crate::component::ComponentView;
use crate::component::defaults;
use crate::dispatch::params::{
    DeviceHandle, DevicePowerState, FileHandle, QueueHandle, RelationType, RequestHandle,
    ResourceList, SpecialFileType,
};
use crate::dispatch::status::Status;
use crate::tree::ComponentSpec;

pub trait LifecycleHandlers: Send + Sync {
    /// Children every instance of this type owns, created with the instance
    fn child_components(&self, _spec: &ComponentSpec) -> Vec<ComponentSpec> {
        Vec::new()
    }

    // --- Open / close ---

    /// The open transition itself; every type that can be opened provides it
    fn open(&self, component: &ComponentView<'_>) -> Status {
        defaults::must_override(component, "open")
    }

    fn close(&self, component: &ComponentView<'_>) {
        defaults::must_override(component, "close")
    }

    /// Runs after a successful open, before client notifications
    fn post_open(&self, _component: &ComponentView<'_>) {}

    /// Runs once per close, before the rundown wait
    fn pre_close(&self, _component: &ComponentView<'_>) {}

    // --- Hardware resources ---

    fn resources_assign(
        &self,
        component: &ComponentView<'_>,
        _raw: ResourceList,
        _translated: ResourceList,
    ) -> Status {
        defaults::validate_resources_assign(component)
    }

    fn prepare_hardware(
        &self,
        _component: &ComponentView<'_>,
        _raw: ResourceList,
        _translated: ResourceList,
    ) -> Status {
        Ok(())
    }

    fn release_hardware(&self, _component: &ComponentView<'_>, _translated: ResourceList) -> Status {
        Ok(())
    }

    // --- Notification registration ---

    fn notification_register(&self, component: &ComponentView<'_>) -> Status {
        defaults::must_override(component, "notification_register")
    }

    fn notification_unregister(&self, component: &ComponentView<'_>) -> Status {
        defaults::must_override(component, "notification_unregister")
    }

    // --- Power ---

    fn d0_entry(&self, _component: &ComponentView<'_>, _previous: DevicePowerState) -> Status {
        Ok(())
    }

    fn d0_entry_post_interrupts_enabled(
        &self,
        _component: &ComponentView<'_>,
        _previous: DevicePowerState,
    ) -> Status {
        Ok(())
    }

    fn d0_exit(&self, _component: &ComponentView<'_>, _target: DevicePowerState) -> Status {
        Ok(())
    }

    fn d0_exit_pre_interrupts_disabled(
        &self,
        _component: &ComponentView<'_>,
        _target: DevicePowerState,
    ) -> Status {
        Ok(())
    }

    // --- Self-managed I/O ---

    fn self_managed_io_init(&self, _component: &ComponentView<'_>) -> Status {
        Ok(())
    }

    fn self_managed_io_restart(&self, _component: &ComponentView<'_>) -> Status {
        Ok(())
    }

    fn self_managed_io_suspend(&self, _component: &ComponentView<'_>) -> Status {
        Ok(())
    }

    fn self_managed_io_cleanup(&self, _component: &ComponentView<'_>) {}

    fn self_managed_io_flush(&self, _component: &ComponentView<'_>) {}

    // --- I/O queue dispatch; `true` means the request was handled ---

    fn queue_read(
        &self,
        _component: &ComponentView<'_>,
        _queue: QueueHandle,
        _request: RequestHandle,
        _length: usize,
    ) -> bool {
        false
    }

    fn queue_write(
        &self,
        _component: &ComponentView<'_>,
        _queue: QueueHandle,
        _request: RequestHandle,
        _length: usize,
    ) -> bool {
        false
    }

    fn queue_device_io_control(
        &self,
        _component: &ComponentView<'_>,
        _queue: QueueHandle,
        _request: RequestHandle,
        _output_length: usize,
        _input_length: usize,
        _code: u32,
    ) -> bool {
        false
    }

    fn queue_internal_device_io_control(
        &self,
        _component: &ComponentView<'_>,
        _queue: QueueHandle,
        _request: RequestHandle,
        _output_length: usize,
        _input_length: usize,
        _code: u32,
    ) -> bool {
        false
    }

    // --- File objects ---

    fn file_create(
        &self,
        _component: &ComponentView<'_>,
        _device: DeviceHandle,
        _request: RequestHandle,
        _file: FileHandle,
    ) -> bool {
        false
    }

    fn file_cleanup(&self, _component: &ComponentView<'_>, _file: FileHandle) -> bool {
        false
    }

    fn file_close(&self, _component: &ComponentView<'_>, _file: FileHandle) -> bool {
        false
    }

    // --- PnP ---

    fn query_remove(&self, _component: &ComponentView<'_>) -> Status {
        Ok(())
    }

    fn query_stop(&self, _component: &ComponentView<'_>) -> Status {
        Ok(())
    }

    fn surprise_removal(&self, _component: &ComponentView<'_>) {}

    fn relations_query(&self, _component: &ComponentView<'_>, _relation: RelationType) {}

    fn usage_notification(
        &self,
        _component: &ComponentView<'_>,
        _file_type: SpecialFileType,
        _in_path: bool,
    ) -> Status {
        Ok(())
    }

    // --- Wake ---

    fn arm_wake_from_s0(&self, _component: &ComponentView<'_>) -> Status {
        Ok(())
    }

    fn arm_wake_from_sx(
        &self,
        _component: &ComponentView<'_>,
        _device_wake_enabled: bool,
        _children_armed_for_wake: bool,
    ) -> Status {
        Ok(())
    }

    fn disarm_wake_from_s0(&self, _component: &ComponentView<'_>) {}

    fn disarm_wake_from_sx(&self, _component: &ComponentView<'_>) {}

    fn wake_from_s0_triggered(&self, _component: &ComponentView<'_>) {}

    fn wake_from_sx_triggered(&self, _component: &ComponentView<'_>) {}
}
