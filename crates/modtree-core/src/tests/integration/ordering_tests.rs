#![cfg(test)]

use crate::dispatch::EventKind;
use crate::dispatch::params::{DevicePowerState, ResourceList};
use crate::tests::integration::common::{FixtureBuilder, parent_with_three_children};

#[test]
fn test_children_first_forward_order() {
    let fx = parent_with_three_children().build();
    fx.dispatcher
        .prepare_hardware(ResourceList(0), ResourceList(0))
        .unwrap();
    assert_eq!(fx.journal.visits("prepare_hardware"), vec!["A", "B", "C", "P"]);
}

#[test]
fn test_parent_first_backward_order() {
    let fx = parent_with_three_children().build();
    fx.dispatcher.query_remove().unwrap();
    assert_eq!(fx.journal.visits("query_remove"), vec!["P", "C", "B", "A"]);
}

#[test]
fn test_parent_first_forward_order() {
    let fx = parent_with_three_children().build();
    fx.dispatcher.d0_exit(DevicePowerState::D3).unwrap();
    assert_eq!(fx.journal.visits("d0_exit"), vec!["P", "A", "B", "C"]);
}

/// Two roots, each with nested children:
///
/// ```text
/// R1           R2
/// ├─ X         └─ Z
/// │  └─ X1
/// └─ Y
/// ```
fn forest() -> FixtureBuilder {
    FixtureBuilder::new()
        .root("R1")
        .child("R1", "X")
        .child("X", "X1")
        .child("R1", "Y")
        .root("R2")
        .child("R2", "Z")
}

#[test]
fn test_root_collection_follows_event_direction() {
    let fx = forest().build();

    fx.dispatcher.self_managed_io_init().unwrap();
    assert_eq!(
        fx.journal.visits("self_managed_io_init"),
        vec!["X1", "X", "Y", "R1", "Z", "R2"]
    );

    fx.dispatcher.self_managed_io_suspend().unwrap();
    assert_eq!(
        fx.journal.visits("self_managed_io_suspend"),
        vec!["R2", "Z", "R1", "Y", "X", "X1"]
    );
}

#[test]
fn test_every_event_visits_every_node_once() {
    let fx = forest().build();
    for kind in EventKind::ALL {
        let event = serde_json::from_str(&format!(r#"{{ "event": "{}" }}"#, kind)).unwrap();
        fx.dispatcher.deliver(&event);
    }
    for kind in EventKind::ALL {
        if matches!(kind, EventKind::NotificationRegister | EventKind::NotificationUnregister) {
            continue; // only notify-policy components are visited by handler
        }
        let mut visited = fx.journal.visits(kind.name());
        visited.sort();
        assert_eq!(visited, vec!["R1", "R2", "X", "X1", "Y", "Z"], "{}", kind);
    }
}
