#![cfg(test)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::executor::block_on;

use crate::component::LifecycleState;
use crate::component::error::ComponentError;
use crate::config::{EngineConfig, RundownConfig, RundownStrategy};
use crate::tests::integration::common::FixtureBuilder;

const OUTSTANDING: usize = 4;

fn close_waits_for_all_releases(config: EngineConfig) {
    let fx = FixtureBuilder::new().root("M").with_config(config).build();
    let id = fx.id("M");
    fx.view("M").open().unwrap();
    for _ in 0..OUTSTANDING {
        fx.view("M").acquire().unwrap();
    }
    assert_eq!(fx.view("M").reference_count(), 1 + OUTSTANDING as u32);

    let closed = Arc::new(AtomicBool::new(false));
    let closer = {
        let tree = fx.tree.clone();
        let closed = closed.clone();
        std::thread::spawn(move || {
            tree.view(id).close();
            closed.store(true, Ordering::SeqCst);
        })
    };

    while !fx.view("M").is_close_pending() {
        std::thread::yield_now();
    }
    assert!(matches!(
        fx.view("M").acquire(),
        Err(ComponentError::NotAvailable { .. })
    ));

    for _ in 0..OUTSTANDING {
        std::thread::sleep(Duration::from_millis(5));
        assert!(!closed.load(Ordering::SeqCst));
        fx.view("M").release();
    }
    closer.join().unwrap();
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(fx.state("M"), LifecycleState::Closed);
    assert_eq!(fx.journal.visits("close"), vec!["M"]);
}

#[test]
fn test_close_waits_with_notify_strategy() {
    close_waits_for_all_releases(EngineConfig::default());
}

#[test]
fn test_close_waits_with_poll_strategy() {
    close_waits_for_all_releases(EngineConfig {
        trace_visits: true,
        rundown: RundownConfig {
            strategy: RundownStrategy::Poll,
            poll_interval_ms: 1,
        },
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_methods_racing_close() {
    let fx = FixtureBuilder::new().root("M").build();
    let id = fx.id("M");
    fx.view("M").open().unwrap();

    // Methods keep calling in until the component refuses them.
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let tree = fx.tree.clone();
            tokio::task::spawn_blocking(move || {
                let mut calls = 0usize;
                while let Ok(guard) = tree.view(id).reference() {
                    calls += 1;
                    std::thread::sleep(Duration::from_micros(50));
                    drop(guard);
                }
                calls
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(5)).await;
    let tree = fx.tree.clone();
    tokio::task::spawn_blocking(move || tree.view(id).close())
        .await
        .unwrap();

    for worker in workers {
        worker.await.unwrap();
    }
    assert_eq!(fx.state("M"), LifecycleState::Closed);
    assert_eq!(fx.view("M").reference_count(), 0);
}

#[test]
fn test_close_async_with_block_on() {
    let fx = FixtureBuilder::new().root("M").build();
    let view = fx.view("M");
    view.open().unwrap();
    {
        let _guard = view.reference().unwrap();
        assert_eq!(view.reference_count(), 2);
    }
    block_on(view.close_async());
    assert_eq!(view.state(), LifecycleState::Closed);
    block_on(view.close_async()); // idempotent
    assert_eq!(fx.journal.visits("close"), vec!["M"]);
}

#[tokio::test]
async fn test_abandoned_async_close_leaves_component_usable() {
    let fx = FixtureBuilder::new().root("M").build();
    let view = fx.view("M");
    view.open().unwrap();
    view.acquire().unwrap();

    let timed_out = tokio::time::timeout(Duration::from_millis(20), view.close_async()).await;
    assert!(timed_out.is_err());
    assert_eq!(view.state(), LifecycleState::Opened);
    assert!(!view.is_close_pending());

    // References are accepted again and a later close goes through.
    view.acquire().unwrap();
    view.release();
    view.release();
    view.close();
    assert_eq!(view.state(), LifecycleState::Closed);
    assert!(view.is_deletable());
    assert_eq!(view.reference_count(), 0);
    assert_eq!(fx.journal.visits("close"), vec!["M"]);
}

#[test]
fn test_second_close_waits_for_the_first() {
    let fx = FixtureBuilder::new().root("M").build();
    let id = fx.id("M");
    fx.view("M").open().unwrap();
    fx.view("M").acquire().unwrap();

    let first = {
        let tree = fx.tree.clone();
        std::thread::spawn(move || tree.view(id).close())
    };
    while !fx.view("M").is_close_pending() {
        std::thread::yield_now();
    }

    let second_done = Arc::new(AtomicBool::new(false));
    let second = {
        let tree = fx.tree.clone();
        let second_done = second_done.clone();
        std::thread::spawn(move || {
            tree.view(id).close();
            // The close it waited on has fully finished.
            assert_eq!(tree.view(id).state(), LifecycleState::Closed);
            second_done.store(true, Ordering::SeqCst);
        })
    };
    std::thread::sleep(Duration::from_millis(20));
    assert!(!second_done.load(Ordering::SeqCst));

    fx.view("M").release();
    first.join().unwrap();
    second.join().unwrap();
    assert!(second_done.load(Ordering::SeqCst));
    assert_eq!(fx.journal.visits("close"), vec!["M"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_closer_takes_over_abandoned_close() {
    let fx = FixtureBuilder::new().root("M").build();
    let id = fx.id("M");
    fx.view("M").open().unwrap();
    fx.view("M").acquire().unwrap();

    // First closer claims the close, then gives up.
    let claimant = {
        let tree = fx.tree.clone();
        tokio::spawn(async move { tree.view(id).close_async().await })
    };
    while !fx.view("M").is_close_pending() {
        tokio::task::yield_now().await;
    }
    let waiter = {
        let tree = fx.tree.clone();
        tokio::spawn(async move { tree.view(id).close_async().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    claimant.abort();
    assert!(claimant.await.unwrap_err().is_cancelled());

    fx.view("M").release();
    waiter.await.unwrap();
    assert_eq!(fx.state("M"), LifecycleState::Closed);
    assert_eq!(fx.journal.visits("close"), vec!["M"]);
}
