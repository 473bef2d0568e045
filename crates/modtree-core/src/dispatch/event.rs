//! The lifecycle event catalogue.
//!
//! Each [`EventKind`] carries its traversal as data: whether parents are
//! visited before or after their children, which direction child lists
//! are walked in, and how per-node results are aggregated.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dispatch::params::{
    DeviceHandle, DevicePowerState, FileHandle, QueueHandle, RelationType, RequestHandle,
    ResourceList, SpecialFileType,
};
use crate::tree::Direction;

/// Whether a node is visited before or after its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    ChildrenFirst,
    ParentFirst,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::ChildrenFirst => write!(f, "children->parent"),
            Order::ParentFirst => write!(f, "parent->children"),
        }
    }
}

/// How per-node results combine into the walk's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// First failure aborts the walk and is returned
    FailFast,
    /// First `true` stops the walk; a parent gates its children
    OrUntilHandled,
    /// Every node is visited; individual failures are discarded
    Unconditional,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::FailFast => write!(f, "fail-fast"),
            Aggregation::OrUntilHandled => write!(f, "or-until-handled"),
            Aggregation::Unconditional => write!(f, "unconditional"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Traversal {
    pub order: Order,
    pub direction: Direction,
    pub aggregation: Aggregation,
}

impl Traversal {
    pub const fn new(order: Order, direction: Direction, aggregation: Aggregation) -> Self {
        Self {
            order,
            direction,
            aggregation,
        }
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.order, self.direction, self.aggregation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PrepareHardware,
    ReleaseHardware,
    D0Entry,
    D0EntryPostInterruptsEnabled,
    D0Exit,
    D0ExitPreInterruptsDisabled,
    SelfManagedIoInit,
    SelfManagedIoRestart,
    SelfManagedIoSuspend,
    SelfManagedIoCleanup,
    SelfManagedIoFlush,
    QueueRead,
    QueueWrite,
    QueueDeviceIoControl,
    QueueInternalDeviceIoControl,
    FileCreate,
    FileCleanup,
    FileClose,
    QueryRemove,
    QueryStop,
    SurpriseRemoval,
    RelationsQuery,
    UsageNotification,
    ArmWakeFromS0,
    ArmWakeFromSx,
    DisarmWakeFromS0,
    DisarmWakeFromSx,
    WakeFromS0Triggered,
    WakeFromSxTriggered,
    NotificationRegister,
    NotificationUnregister,
    ResourcesAssign,
}

impl EventKind {
    pub const ALL: [EventKind; 32] = [
        EventKind::PrepareHardware,
        EventKind::ReleaseHardware,
        EventKind::D0Entry,
        EventKind::D0EntryPostInterruptsEnabled,
        EventKind::D0Exit,
        EventKind::D0ExitPreInterruptsDisabled,
        EventKind::SelfManagedIoInit,
        EventKind::SelfManagedIoRestart,
        EventKind::SelfManagedIoSuspend,
        EventKind::SelfManagedIoCleanup,
        EventKind::SelfManagedIoFlush,
        EventKind::QueueRead,
        EventKind::QueueWrite,
        EventKind::QueueDeviceIoControl,
        EventKind::QueueInternalDeviceIoControl,
        EventKind::FileCreate,
        EventKind::FileCleanup,
        EventKind::FileClose,
        EventKind::QueryRemove,
        EventKind::QueryStop,
        EventKind::SurpriseRemoval,
        EventKind::RelationsQuery,
        EventKind::UsageNotification,
        EventKind::ArmWakeFromS0,
        EventKind::ArmWakeFromSx,
        EventKind::DisarmWakeFromS0,
        EventKind::DisarmWakeFromSx,
        EventKind::WakeFromS0Triggered,
        EventKind::WakeFromSxTriggered,
        EventKind::NotificationRegister,
        EventKind::NotificationUnregister,
        EventKind::ResourcesAssign,
    ];

    /// Order, direction and aggregation of this event's walk
    pub const fn traversal(self) -> Traversal {
        use Aggregation::*;
        use Direction::*;
        use EventKind::*;
        use Order::*;
        match self {
            PrepareHardware | D0Entry | D0EntryPostInterruptsEnabled | SelfManagedIoInit
            | SelfManagedIoRestart | UsageNotification | NotificationRegister | ResourcesAssign => {
                Traversal::new(ChildrenFirst, Forward, FailFast)
            }
            ReleaseHardware | D0Exit | D0ExitPreInterruptsDisabled => {
                Traversal::new(ParentFirst, Forward, FailFast)
            }
            SelfManagedIoSuspend | QueryRemove | QueryStop | ArmWakeFromS0 | ArmWakeFromSx => {
                Traversal::new(ParentFirst, Backward, FailFast)
            }
            SelfManagedIoCleanup | SelfManagedIoFlush | SurpriseRemoval | NotificationUnregister => {
                Traversal::new(ParentFirst, Backward, Unconditional)
            }
            QueueRead | QueueWrite | QueueDeviceIoControl | QueueInternalDeviceIoControl
            | FileCreate | FileCleanup | FileClose => Traversal::new(ParentFirst, Forward, OrUntilHandled),
            RelationsQuery | DisarmWakeFromS0 | DisarmWakeFromSx | WakeFromS0Triggered
            | WakeFromSxTriggered => Traversal::new(ChildrenFirst, Forward, Unconditional),
        }
    }

    pub fn aggregation(self) -> Aggregation {
        self.traversal().aggregation
    }

    pub const fn name(self) -> &'static str {
        match self {
            EventKind::PrepareHardware => "prepare_hardware",
            EventKind::ReleaseHardware => "release_hardware",
            EventKind::D0Entry => "d0_entry",
            EventKind::D0EntryPostInterruptsEnabled => "d0_entry_post_interrupts_enabled",
            EventKind::D0Exit => "d0_exit",
            EventKind::D0ExitPreInterruptsDisabled => "d0_exit_pre_interrupts_disabled",
            EventKind::SelfManagedIoInit => "self_managed_io_init",
            EventKind::SelfManagedIoRestart => "self_managed_io_restart",
            EventKind::SelfManagedIoSuspend => "self_managed_io_suspend",
            EventKind::SelfManagedIoCleanup => "self_managed_io_cleanup",
            EventKind::SelfManagedIoFlush => "self_managed_io_flush",
            EventKind::QueueRead => "queue_read",
            EventKind::QueueWrite => "queue_write",
            EventKind::QueueDeviceIoControl => "queue_device_io_control",
            EventKind::QueueInternalDeviceIoControl => "queue_internal_device_io_control",
            EventKind::FileCreate => "file_create",
            EventKind::FileCleanup => "file_cleanup",
            EventKind::FileClose => "file_close",
            EventKind::QueryRemove => "query_remove",
            EventKind::QueryStop => "query_stop",
            EventKind::SurpriseRemoval => "surprise_removal",
            EventKind::RelationsQuery => "relations_query",
            EventKind::UsageNotification => "usage_notification",
            EventKind::ArmWakeFromS0 => "arm_wake_from_s0",
            EventKind::ArmWakeFromSx => "arm_wake_from_sx",
            EventKind::DisarmWakeFromS0 => "disarm_wake_from_s0",
            EventKind::DisarmWakeFromSx => "disarm_wake_from_sx",
            EventKind::WakeFromS0Triggered => "wake_from_s0_triggered",
            EventKind::WakeFromSxTriggered => "wake_from_sx_triggered",
            EventKind::NotificationRegister => "notification_register",
            EventKind::NotificationUnregister => "notification_unregister",
            EventKind::ResourcesAssign => "resources_assign",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event as the host delivers it, parameters included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    PrepareHardware {
        #[serde(default)]
        raw: ResourceList,
        #[serde(default)]
        translated: ResourceList,
    },
    ReleaseHardware {
        #[serde(default)]
        translated: ResourceList,
    },
    D0Entry {
        #[serde(default)]
        previous: DevicePowerState,
    },
    D0EntryPostInterruptsEnabled {
        #[serde(default)]
        previous: DevicePowerState,
    },
    D0Exit {
        #[serde(default)]
        target: DevicePowerState,
    },
    D0ExitPreInterruptsDisabled {
        #[serde(default)]
        target: DevicePowerState,
    },
    SelfManagedIoInit,
    SelfManagedIoRestart,
    SelfManagedIoSuspend,
    SelfManagedIoCleanup,
    SelfManagedIoFlush,
    QueueRead {
        #[serde(default)]
        queue: QueueHandle,
        #[serde(default)]
        request: RequestHandle,
        #[serde(default)]
        length: usize,
    },
    QueueWrite {
        #[serde(default)]
        queue: QueueHandle,
        #[serde(default)]
        request: RequestHandle,
        #[serde(default)]
        length: usize,
    },
    QueueDeviceIoControl {
        #[serde(default)]
        queue: QueueHandle,
        #[serde(default)]
        request: RequestHandle,
        #[serde(default)]
        output_length: usize,
        #[serde(default)]
        input_length: usize,
        #[serde(default)]
        code: u32,
    },
    QueueInternalDeviceIoControl {
        #[serde(default)]
        queue: QueueHandle,
        #[serde(default)]
        request: RequestHandle,
        #[serde(default)]
        output_length: usize,
        #[serde(default)]
        input_length: usize,
        #[serde(default)]
        code: u32,
    },
    FileCreate {
        #[serde(default)]
        device: DeviceHandle,
        #[serde(default)]
        request: RequestHandle,
        #[serde(default)]
        file: FileHandle,
    },
    FileCleanup {
        #[serde(default)]
        file: FileHandle,
    },
    FileClose {
        #[serde(default)]
        file: FileHandle,
    },
    QueryRemove,
    QueryStop,
    SurpriseRemoval,
    RelationsQuery {
        #[serde(default)]
        relation: RelationType,
    },
    UsageNotification {
        #[serde(default)]
        file_type: SpecialFileType,
        #[serde(default)]
        in_path: bool,
    },
    ArmWakeFromS0,
    ArmWakeFromSx {
        #[serde(default)]
        device_wake_enabled: bool,
        #[serde(default)]
        children_armed_for_wake: bool,
    },
    DisarmWakeFromS0,
    DisarmWakeFromSx,
    WakeFromS0Triggered,
    WakeFromSxTriggered,
    NotificationRegister,
    NotificationUnregister,
    ResourcesAssign {
        #[serde(default)]
        raw: ResourceList,
        #[serde(default)]
        translated: ResourceList,
    },
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::PrepareHardware { .. } => EventKind::PrepareHardware,
            HostEvent::ReleaseHardware { .. } => EventKind::ReleaseHardware,
            HostEvent::D0Entry { .. } => EventKind::D0Entry,
            HostEvent::D0EntryPostInterruptsEnabled { .. } => EventKind::D0EntryPostInterruptsEnabled,
            HostEvent::D0Exit { .. } => EventKind::D0Exit,
            HostEvent::D0ExitPreInterruptsDisabled { .. } => EventKind::D0ExitPreInterruptsDisabled,
            HostEvent::SelfManagedIoInit => EventKind::SelfManagedIoInit,
            HostEvent::SelfManagedIoRestart => EventKind::SelfManagedIoRestart,
            HostEvent::SelfManagedIoSuspend => EventKind::SelfManagedIoSuspend,
            HostEvent::SelfManagedIoCleanup => EventKind::SelfManagedIoCleanup,
            HostEvent::SelfManagedIoFlush => EventKind::SelfManagedIoFlush,
            HostEvent::QueueRead { .. } => EventKind::QueueRead,
            HostEvent::QueueWrite { .. } => EventKind::QueueWrite,
            HostEvent::QueueDeviceIoControl { .. } => EventKind::QueueDeviceIoControl,
            HostEvent::QueueInternalDeviceIoControl { .. } => EventKind::QueueInternalDeviceIoControl,
            HostEvent::FileCreate { .. } => EventKind::FileCreate,
            HostEvent::FileCleanup { .. } => EventKind::FileCleanup,
            HostEvent::FileClose { .. } => EventKind::FileClose,
            HostEvent::QueryRemove => EventKind::QueryRemove,
            HostEvent::QueryStop => EventKind::QueryStop,
            HostEvent::SurpriseRemoval => EventKind::SurpriseRemoval,
            HostEvent::RelationsQuery { .. } => EventKind::RelationsQuery,
            HostEvent::UsageNotification { .. } => EventKind::UsageNotification,
            HostEvent::ArmWakeFromS0 => EventKind::ArmWakeFromS0,
            HostEvent::ArmWakeFromSx { .. } => EventKind::ArmWakeFromSx,
            HostEvent::DisarmWakeFromS0 => EventKind::DisarmWakeFromS0,
            HostEvent::DisarmWakeFromSx => EventKind::DisarmWakeFromSx,
            HostEvent::WakeFromS0Triggered => EventKind::WakeFromS0Triggered,
            HostEvent::WakeFromSxTriggered => EventKind::WakeFromSxTriggered,
            HostEvent::NotificationRegister => EventKind::NotificationRegister,
            HostEvent::NotificationUnregister => EventKind::NotificationUnregister,
            HostEvent::ResourcesAssign { .. } => EventKind::ResourcesAssign,
        }
    }
}
