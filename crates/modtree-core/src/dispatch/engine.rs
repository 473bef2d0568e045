//! One dispatch routine per lifecycle event.
use std::fmt;
use std::sync::Arc;

use crate::component::ComponentView;
use crate::component::defaults::{enter_checkpoint, leave_checkpoint};
use crate::component::descriptor::Checkpoint;
use crate::dispatch::error::DispatchError;
use crate::dispatch::event::{EventKind, HostEvent};
use crate::dispatch::params::{
    DeviceHandle, DevicePowerState, FileHandle, QueueHandle, RelationType, RequestHandle,
    ResourceList, SpecialFileType,
};
use crate::dispatch::walk::{fail_fast, fan_out, until_handled};
use crate::tree::ComponentTree;

/// Result of delivering a [`HostEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Fail-fast walk visited every node successfully
    Completed,
    /// Fail-fast walk aborted
    Failed(DispatchError),
    /// Some node handled the request
    Handled,
    /// No node handled the request
    Unhandled,
    /// Unconditional walk finished
    FannedOut,
}

impl DispatchOutcome {
    fn from_status(result: Result<(), DispatchError>) -> Self {
        match result {
            Ok(()) => DispatchOutcome::Completed,
            Err(err) => DispatchOutcome::Failed(err),
        }
    }

    fn from_handled(handled: bool) -> Self {
        if handled {
            DispatchOutcome::Handled
        } else {
            DispatchOutcome::Unhandled
        }
    }

    /// `false` only for an aborted fail-fast walk
    pub fn is_success(&self) -> bool {
        !matches!(self, DispatchOutcome::Failed(_))
    }

    pub fn into_result(self) -> Result<DispatchOutcome, DispatchError> {
        match self {
            DispatchOutcome::Failed(err) => Err(err),
            other => Ok(other),
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Completed => write!(f, "completed"),
            DispatchOutcome::Failed(err) => write!(f, "failed: {}", err),
            DispatchOutcome::Handled => write!(f, "handled"),
            DispatchOutcome::Unhandled => write!(f, "unhandled"),
            DispatchOutcome::FannedOut => write!(f, "fanned out"),
        }
    }
}

/// Entry points the host calls, one per event kind
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tree: Arc<ComponentTree>,
}

impl Dispatcher {
    pub fn new(tree: Arc<ComponentTree>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Arc<ComponentTree> {
        &self.tree
    }

    // --- Hardware resources ---

    pub fn resources_assign(&self, raw: ResourceList, translated: ResourceList) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::ResourcesAssign, |c| {
            c.handlers().resources_assign(c, raw, translated)
        })
    }

    /// Runs each handler, then the resource-assign checkpoint of its policy
    pub fn prepare_hardware(&self, raw: ResourceList, translated: ResourceList) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::PrepareHardware, |c| {
            c.handlers().prepare_hardware(c, raw, translated)?;
            enter_checkpoint(c, Checkpoint::ResourceAssign)
        })
    }

    /// Reverses the resource-assign checkpoint, then runs each handler
    pub fn release_hardware(&self, translated: ResourceList) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::ReleaseHardware, |c| {
            leave_checkpoint(c, Checkpoint::ResourceAssign);
            c.handlers().release_hardware(c, translated)
        })
    }

    // --- Power ---

    pub fn d0_entry(&self, previous: DevicePowerState) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::D0Entry, |c| {
            c.handlers().d0_entry(c, previous)?;
            enter_checkpoint(c, Checkpoint::PowerEntry)
        })
    }

    pub fn d0_entry_post_interrupts_enabled(&self, previous: DevicePowerState) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::D0EntryPostInterruptsEnabled, |c| {
            c.handlers().d0_entry_post_interrupts_enabled(c, previous)
        })
    }

    pub fn d0_exit(&self, target: DevicePowerState) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::D0Exit, |c| {
            leave_checkpoint(c, Checkpoint::PowerEntry);
            c.handlers().d0_exit(c, target)
        })
    }

    pub fn d0_exit_pre_interrupts_disabled(&self, target: DevicePowerState) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::D0ExitPreInterruptsDisabled, |c| {
            c.handlers().d0_exit_pre_interrupts_disabled(c, target)
        })
    }

    // --- Self-managed I/O ---

    pub fn self_managed_io_init(&self) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::SelfManagedIoInit, |c| {
            c.handlers().self_managed_io_init(c)
        })
    }

    pub fn self_managed_io_restart(&self) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::SelfManagedIoRestart, |c| {
            c.handlers().self_managed_io_restart(c)
        })
    }

    pub fn self_managed_io_suspend(&self) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::SelfManagedIoSuspend, |c| {
            c.handlers().self_managed_io_suspend(c)
        })
    }

    pub fn self_managed_io_cleanup(&self) {
        self.unconditional(EventKind::SelfManagedIoCleanup, |c| {
            c.handlers().self_managed_io_cleanup(c)
        });
    }

    pub fn self_managed_io_flush(&self) {
        self.unconditional(EventKind::SelfManagedIoFlush, |c| {
            c.handlers().self_managed_io_flush(c)
        });
    }

    // --- I/O queues ---

    pub fn queue_read(&self, queue: QueueHandle, request: RequestHandle, length: usize) -> bool {
        until_handled(&self.tree, EventKind::QueueRead, |c| {
            c.handlers().queue_read(c, queue, request, length)
        })
    }

    pub fn queue_write(&self, queue: QueueHandle, request: RequestHandle, length: usize) -> bool {
        until_handled(&self.tree, EventKind::QueueWrite, |c| {
            c.handlers().queue_write(c, queue, request, length)
        })
    }

    pub fn queue_device_io_control(
        &self,
        queue: QueueHandle,
        request: RequestHandle,
        output_length: usize,
        input_length: usize,
        code: u32,
    ) -> bool {
        until_handled(&self.tree, EventKind::QueueDeviceIoControl, |c| {
            c.handlers()
                .queue_device_io_control(c, queue, request, output_length, input_length, code)
        })
    }

    pub fn queue_internal_device_io_control(
        &self,
        queue: QueueHandle,
        request: RequestHandle,
        output_length: usize,
        input_length: usize,
        code: u32,
    ) -> bool {
        until_handled(&self.tree, EventKind::QueueInternalDeviceIoControl, |c| {
            c.handlers()
                .queue_internal_device_io_control(c, queue, request, output_length, input_length, code)
        })
    }

    // --- File objects ---

    pub fn file_create(&self, device: DeviceHandle, request: RequestHandle, file: FileHandle) -> bool {
        until_handled(&self.tree, EventKind::FileCreate, |c| {
            c.handlers().file_create(c, device, request, file)
        })
    }

    pub fn file_cleanup(&self, file: FileHandle) -> bool {
        until_handled(&self.tree, EventKind::FileCleanup, |c| c.handlers().file_cleanup(c, file))
    }

    pub fn file_close(&self, file: FileHandle) -> bool {
        until_handled(&self.tree, EventKind::FileClose, |c| c.handlers().file_close(c, file))
    }

    // --- PnP ---

    pub fn query_remove(&self) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::QueryRemove, |c| c.handlers().query_remove(c))
    }

    pub fn query_stop(&self) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::QueryStop, |c| c.handlers().query_stop(c))
    }

    pub fn surprise_removal(&self) {
        self.unconditional(EventKind::SurpriseRemoval, |c| c.handlers().surprise_removal(c));
    }

    pub fn relations_query(&self, relation: RelationType) {
        self.unconditional(EventKind::RelationsQuery, |c| {
            c.handlers().relations_query(c, relation)
        });
    }

    pub fn usage_notification(&self, file_type: SpecialFileType, in_path: bool) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::UsageNotification, |c| {
            c.handlers().usage_notification(c, file_type, in_path)
        })
    }

    // --- Wake ---

    pub fn arm_wake_from_s0(&self) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::ArmWakeFromS0, |c| c.handlers().arm_wake_from_s0(c))
    }

    pub fn arm_wake_from_sx(
        &self,
        device_wake_enabled: bool,
        children_armed_for_wake: bool,
    ) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::ArmWakeFromSx, |c| {
            c.handlers()
                .arm_wake_from_sx(c, device_wake_enabled, children_armed_for_wake)
        })
    }

    pub fn disarm_wake_from_s0(&self) {
        self.unconditional(EventKind::DisarmWakeFromS0, |c| c.handlers().disarm_wake_from_s0(c));
    }

    pub fn disarm_wake_from_sx(&self) {
        self.unconditional(EventKind::DisarmWakeFromSx, |c| c.handlers().disarm_wake_from_sx(c));
    }

    pub fn wake_from_s0_triggered(&self) {
        self.unconditional(EventKind::WakeFromS0Triggered, |c| {
            c.handlers().wake_from_s0_triggered(c)
        });
    }

    pub fn wake_from_sx_triggered(&self) {
        self.unconditional(EventKind::WakeFromSxTriggered, |c| {
            c.handlers().wake_from_sx_triggered(c)
        });
    }

    // --- Notification registration ---

    /// Registers every notify-on-create component, children first
    pub fn notification_register(&self) -> Result<(), DispatchError> {
        fail_fast(&self.tree, EventKind::NotificationRegister, |c| {
            enter_checkpoint(c, Checkpoint::Create)
        })
    }

    pub fn notification_unregister(&self) {
        fan_out(
            &self.tree,
            EventKind::NotificationUnregister.traversal(),
            EventKind::NotificationUnregister.name(),
            |c| {
                leave_checkpoint(c, Checkpoint::Create);
                Ok(())
            },
        );
    }

    fn unconditional<F>(&self, event: EventKind, mut visit: F)
    where
        F: FnMut(&ComponentView<'_>),
    {
        fan_out(&self.tree, event.traversal(), event.name(), |c| {
            visit(c);
            Ok(())
        });
    }

    /// Route a host event to its dispatch routine
    pub fn deliver(&self, event: &HostEvent) -> DispatchOutcome {
        log::debug!("Delivering {} ({})", event.kind(), event.kind().traversal());
        match *event {
            HostEvent::PrepareHardware { raw, translated } => {
                DispatchOutcome::from_status(self.prepare_hardware(raw, translated))
            }
            HostEvent::ReleaseHardware { translated } => {
                DispatchOutcome::from_status(self.release_hardware(translated))
            }
            HostEvent::D0Entry { previous } => DispatchOutcome::from_status(self.d0_entry(previous)),
            HostEvent::D0EntryPostInterruptsEnabled { previous } => {
                DispatchOutcome::from_status(self.d0_entry_post_interrupts_enabled(previous))
            }
            HostEvent::D0Exit { target } => DispatchOutcome::from_status(self.d0_exit(target)),
            HostEvent::D0ExitPreInterruptsDisabled { target } => {
                DispatchOutcome::from_status(self.d0_exit_pre_interrupts_disabled(target))
            }
            HostEvent::SelfManagedIoInit => DispatchOutcome::from_status(self.self_managed_io_init()),
            HostEvent::SelfManagedIoRestart => DispatchOutcome::from_status(self.self_managed_io_restart()),
            HostEvent::SelfManagedIoSuspend => DispatchOutcome::from_status(self.self_managed_io_suspend()),
            HostEvent::SelfManagedIoCleanup => {
                self.self_managed_io_cleanup();
                DispatchOutcome::FannedOut
            }
            HostEvent::SelfManagedIoFlush => {
                self.self_managed_io_flush();
                DispatchOutcome::FannedOut
            }
            HostEvent::QueueRead { queue, request, length } => {
                DispatchOutcome::from_handled(self.queue_read(queue, request, length))
            }
            HostEvent::QueueWrite { queue, request, length } => {
                DispatchOutcome::from_handled(self.queue_write(queue, request, length))
            }
            HostEvent::QueueDeviceIoControl {
                queue,
                request,
                output_length,
                input_length,
                code,
            } => DispatchOutcome::from_handled(self.queue_device_io_control(
                queue,
                request,
                output_length,
                input_length,
                code,
            )),
            HostEvent::QueueInternalDeviceIoControl {
                queue,
                request,
                output_length,
                input_length,
                code,
            } => DispatchOutcome::from_handled(self.queue_internal_device_io_control(
                queue,
                request,
                output_length,
                input_length,
                code,
            )),
            HostEvent::FileCreate { device, request, file } => {
                DispatchOutcome::from_handled(self.file_create(device, request, file))
            }
            HostEvent::FileCleanup { file } => DispatchOutcome::from_handled(self.file_cleanup(file)),
            HostEvent::FileClose { file } => DispatchOutcome::from_handled(self.file_close(file)),
            HostEvent::QueryRemove => DispatchOutcome::from_status(self.query_remove()),
            HostEvent::QueryStop => DispatchOutcome::from_status(self.query_stop()),
            HostEvent::SurpriseRemoval => {
                self.surprise_removal();
                DispatchOutcome::FannedOut
            }
            HostEvent::RelationsQuery { relation } => {
                self.relations_query(relation);
                DispatchOutcome::FannedOut
            }
            HostEvent::UsageNotification { file_type, in_path } => {
                DispatchOutcome::from_status(self.usage_notification(file_type, in_path))
            }
            HostEvent::ArmWakeFromS0 => DispatchOutcome::from_status(self.arm_wake_from_s0()),
            HostEvent::ArmWakeFromSx {
                device_wake_enabled,
                children_armed_for_wake,
            } => DispatchOutcome::from_status(self.arm_wake_from_sx(device_wake_enabled, children_armed_for_wake)),
            HostEvent::DisarmWakeFromS0 => {
                self.disarm_wake_from_s0();
                DispatchOutcome::FannedOut
            }
            HostEvent::DisarmWakeFromSx => {
                self.disarm_wake_from_sx();
                DispatchOutcome::FannedOut
            }
            HostEvent::WakeFromS0Triggered => {
                self.wake_from_s0_triggered();
                DispatchOutcome::FannedOut
            }
            HostEvent::WakeFromSxTriggered => {
                self.wake_from_sx_triggered();
                DispatchOutcome::FannedOut
            }
            HostEvent::NotificationRegister => DispatchOutcome::from_status(self.notification_register()),
            HostEvent::NotificationUnregister => {
                self.notification_unregister();
                DispatchOutcome::FannedOut
            }
            HostEvent::ResourcesAssign { raw, translated } => {
                DispatchOutcome::from_status(self.resources_assign(raw, translated))
            }
        }
    }
}
