#![cfg(test)]

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::component::OpenPolicy;
use crate::dispatch::params::DevicePowerState;
use crate::tests::integration::common::{Fixture, FixtureBuilder};

const POLICIES: [OpenPolicy; 4] = [
    OpenPolicy::Manual,
    OpenPolicy::OpenOnPowerEntry,
    OpenPolicy::NotifyOnPowerEntry,
    OpenPolicy::OpenOnResourceAssign,
];

/// Random forest of up to `max_nodes` recording components
fn random_fixture(rng: &mut StdRng, max_nodes: usize) -> Fixture {
    let count = rng.gen_range(1..=max_nodes);
    let mut builder = FixtureBuilder::new();
    let mut names: Vec<String> = Vec::with_capacity(count);
    for index in 0..count {
        let name = format!("n{}", index);
        builder = if names.is_empty() || rng.gen_bool(0.2) {
            builder.root(&name)
        } else {
            let parent = &names[rng.gen_range(0..names.len())];
            builder.child(parent, &name)
        };
        builder = builder.policy(&name, POLICIES[rng.gen_range(0..POLICIES.len())]);
        names.push(name);
    }
    builder.build()
}

fn visited(fx: &Fixture, label: &str) -> BTreeSet<String> {
    fx.journal.visits(label).into_iter().collect()
}

#[test]
fn test_power_entry_and_exit_visit_the_same_nodes() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..50 {
        let fx = random_fixture(&mut rng, 24);

        fx.dispatcher.d0_entry(DevicePowerState::D3).unwrap();
        fx.dispatcher
            .d0_entry_post_interrupts_enabled(DevicePowerState::D3)
            .unwrap();
        fx.dispatcher
            .d0_exit_pre_interrupts_disabled(DevicePowerState::D3)
            .unwrap();
        fx.dispatcher.d0_exit(DevicePowerState::D3).unwrap();

        assert_eq!(visited(&fx, "d0_entry"), visited(&fx, "d0_exit"));
        assert_eq!(
            visited(&fx, "d0_entry_post_interrupts_enabled"),
            visited(&fx, "d0_exit_pre_interrupts_disabled")
        );
        assert_eq!(visited(&fx, "d0_entry").len(), fx.tree.len());

        // Whatever power entry opened or registered, power exit reversed.
        assert_eq!(visited(&fx, "open"), visited(&fx, "close"));
        assert_eq!(
            visited(&fx, "notification_register"),
            visited(&fx, "notification_unregister")
        );
    }
}

#[test]
fn test_entry_order_is_reverse_of_exit_order_for_single_parent() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let children = rng.gen_range(1..8);
        let mut builder = FixtureBuilder::new().root("P");
        for index in 0..children {
            builder = builder.child("P", &format!("c{}", index));
        }
        let fx = builder.build();

        fx.dispatcher.self_managed_io_init().unwrap();
        fx.dispatcher.self_managed_io_suspend().unwrap();
        let mut init = fx.journal.visits("self_managed_io_init");
        init.reverse();
        assert_eq!(init, fx.journal.visits("self_managed_io_suspend"));
    }
}
