//! Opaque parameters passed through from the host.
//!
//! The engine never interprets these; it hands them to every handler it
//! visits unchanged.
use serde::{Deserialize, Serialize};

macro_rules! opaque_handle {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl From<u64> for $name {
                fn from(raw: u64) -> Self {
                    $name(raw)
                }
            }
        )+
    };
}

opaque_handle!(
    /// Host-owned list of hardware resources
    ResourceList,
    /// In-flight I/O request
    RequestHandle,
    /// I/O queue the request arrived on
    QueueHandle,
    /// File object
    FileHandle,
    /// Device object
    DeviceHandle,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DevicePowerState {
    D0,
    D1,
    D2,
    #[default]
    D3,
    D3Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    #[default]
    BusRelations,
    EjectionRelations,
    RemovalRelations,
    TargetDeviceRelation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialFileType {
    #[default]
    Paging,
    Hibernation,
    Dump,
    Boot,
}
