#![cfg(test)]

use crate::component::LifecycleState;
use crate::dispatch::params::{DeviceHandle, FileHandle, RequestHandle};
use crate::dispatch::{DispatchOutcome, EventKind, HostEvent, StatusCode};
use crate::kernel::host::DeviceHost;
use crate::tests::integration::common::FixtureBuilder;

/// P with children A, B in that order
fn three_nodes() -> FixtureBuilder {
    FixtureBuilder::new().root("P").child("P", "A").child("P", "B")
}

#[test]
fn test_fail_fast_scenario() {
    let fx = three_nodes()
        .fail("B", EventKind::SelfManagedIoRestart, StatusCode::InvalidDeviceState)
        .build();

    let err = fx.dispatcher.self_managed_io_restart().unwrap_err();
    assert_eq!(fx.journal.visits("self_managed_io_restart"), vec!["A", "B"]);
    assert_eq!(err.status(), StatusCode::InvalidDeviceState);
    assert_eq!(err.component(), fx.id("B"));
}

#[test]
fn test_or_until_handled_scenario() {
    let fx = three_nodes().handles("A", EventKind::FileCreate).build();

    let handled = fx
        .dispatcher
        .file_create(DeviceHandle(1), RequestHandle(2), FileHandle(3));
    assert!(handled);
    assert_eq!(fx.journal.visits("file_create"), vec!["P", "A"]);
}

#[test]
fn test_no_partial_undo_after_failure() {
    // A opens at resource assignment, B then fails: A stays open.
    let fx = three_nodes()
        .policy("A", crate::component::OpenPolicy::OpenOnResourceAssign)
        .fail("B", EventKind::PrepareHardware, StatusCode::InsufficientResources)
        .build();
    let host = DeviceHost::new(fx.tree.clone());
    host.create().unwrap();

    let outcome = host
        .deliver(&serde_json::from_str::<HostEvent>(r#"{ "event": "prepare_hardware" }"#).unwrap())
        .unwrap();
    assert!(matches!(outcome, DispatchOutcome::Failed(ref err) if err.status() == StatusCode::InsufficientResources));
    assert_eq!(fx.state("A"), LifecycleState::Opened);
    assert_eq!(fx.state("P"), LifecycleState::Created);

    // Teardown still closes A.
    host.destroy().unwrap();
    assert_eq!(fx.state("A"), LifecycleState::Closed);
}

#[test]
fn test_full_device_lifecycle() {
    let fx = three_nodes()
        .policy("P", crate::component::OpenPolicy::OpenOnResourceAssign)
        .policy("A", crate::component::OpenPolicy::OpenOnPowerEntry)
        .policy("B", crate::component::OpenPolicy::NotifyOnPowerEntry)
        .build();
    let host = DeviceHost::new(fx.tree.clone());
    host.create().unwrap();

    let script = [
        r#"{ "event": "prepare_hardware" }"#,
        r#"{ "event": "d0_entry", "previous": "D3" }"#,
        r#"{ "event": "self_managed_io_init" }"#,
        r#"{ "event": "self_managed_io_suspend" }"#,
        r#"{ "event": "d0_exit", "target": "D3" }"#,
        r#"{ "event": "release_hardware" }"#,
    ];
    let mut states = Vec::new();
    for step in script {
        let event: HostEvent = serde_json::from_str(step).unwrap();
        assert!(host.deliver(&event).unwrap().is_success(), "{}", step);
        states.push((fx.state("P"), fx.state("A")));
    }

    use LifecycleState::*;
    assert_eq!(
        states,
        vec![
            (Opened, Created),
            (Opened, Opened),
            (Opened, Opened),
            (Opened, Opened),
            (Opened, Closed),
            (Closed, Closed),
        ]
    );
    assert_eq!(fx.journal.visits("notification_register"), vec!["B"]);
    assert_eq!(fx.journal.visits("notification_unregister"), vec!["B"]);
    host.destroy().unwrap();
}
