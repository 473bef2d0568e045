//! The open/close state machine.
//!
//! ```text
//! Created --open--> Opening --ok--> Opened --close--> Closing --> Closed
//!    ^                 |                                            |
//!    +-----failed------+                       Closed --open--> Opening
//! ```
use std::fmt;
use std::sync::PoisonError;
use std::sync::atomic::Ordering;

use serde::{Deserialize, Serialize};

use crate::component::descriptor::Checkpoint;
use crate::component::{ComponentView, invariant_violation};
use crate::dispatch::status::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Created,
    Opening,
    Opened,
    Closing,
    Closed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Opening => "opening",
            LifecycleState::Opened => "opened",
            LifecycleState::Closing => "closing",
            LifecycleState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Mutable lifecycle bookkeeping of one component
#[derive(Debug)]
pub(crate) struct LifecycleCell {
    pub(crate) state: LifecycleState,
    pub(crate) pre_close_fired: bool,
    pub(crate) close_in_progress: bool,
    /// Checkpoint whose entry side acted and still awaits its reversal
    pub(crate) checkpoint: Option<Checkpoint>,
}

impl Default for LifecycleCell {
    fn default() -> Self {
        Self {
            state: LifecycleState::Created,
            pre_close_fired: false,
            close_in_progress: false,
            checkpoint: None,
        }
    }
}

/// Open a component from `Created` or `Closed`.
///
/// On failure the component goes back to `Created` and becomes deletable.
pub fn open(component: &ComponentView<'_>) -> Status {
    let inner = component.component();
    {
        let mut cell = inner.lifecycle();
        let state = cell.state;
        match state {
            LifecycleState::Created | LifecycleState::Closed => cell.state = LifecycleState::Opening,
            other => {
                drop(cell);
                invariant_violation(component, &format!("open requested while {}", other));
            }
        }
    }

    log::debug!("Opening component '{}' ({})", component.name(), component.id());
    match component.handlers().open(component) {
        Ok(()) => {
            inner.rundown.seed();
            {
                let mut cell = inner.lifecycle();
                cell.state = LifecycleState::Opened;
                cell.pre_close_fired = false;
            }
            inner.deletable.store(false, Ordering::SeqCst);
            log::info!("Component '{}' opened", component.name());

            component.handlers().post_open(component);
            inner.notifications.fire_post_open(component);
            Ok(())
        }
        Err(status) => {
            inner.lifecycle().state = LifecycleState::Created;
            inner.deletable.store(true, Ordering::SeqCst);
            log::warn!("Open of component '{}' failed: {}", component.name(), status);
            Err(status)
        }
    }
}

/// Close an opened component, blocking until its references drain.
///
/// Closing a component that is not open does nothing. When another caller
/// is already closing it, this waits for that close to finish (or to be
/// abandoned, in which case this caller takes it over). Must not be called
/// from the component's own pre-close or close handler.
pub fn close(component: &ComponentView<'_>) {
    loop {
        match begin_close(component) {
            CloseClaim::Claimed => break,
            CloseClaim::Idle => return,
            CloseClaim::Busy => wait_for_other_close(component),
        }
    }
    component.component().rundown.drain_and_wait();
    finish_close(component);
}

/// Like [`close`], but awaits the drain instead of blocking the thread.
///
/// Dropping the future before it completes abandons the close: the
/// component stays open and accepts references again.
pub async fn close_async(component: &ComponentView<'_>) {
    let inner = component.component();
    loop {
        // Register interest before checking so a finishing close is not missed.
        let done = inner.close_done_async.notified();
        tokio::pin!(done);
        done.as_mut().enable();
        match begin_close(component) {
            CloseClaim::Claimed => break,
            CloseClaim::Idle => return,
            CloseClaim::Busy => done.await,
        }
    }

    let mut abandon = AbandonOnDrop {
        component,
        armed: true,
    };
    inner.rundown.drain_and_wait_async().await;
    abandon.armed = false;
    finish_close(component);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseClaim {
    /// This caller owns the close
    Claimed,
    /// Another caller is closing the component
    Busy,
    /// Nothing to close
    Idle,
}

/// Claim the close and fire the pre-close hooks.
fn begin_close(component: &ComponentView<'_>) -> CloseClaim {
    let fire_pre_close = {
        let mut cell = component.component().lifecycle();
        let state = cell.state;
        match state {
            LifecycleState::Opened if cell.close_in_progress => return CloseClaim::Busy,
            LifecycleState::Opened => {
                cell.close_in_progress = true;
                let fire = !cell.pre_close_fired;
                cell.pre_close_fired = true;
                fire
            }
            LifecycleState::Closing => return CloseClaim::Busy,
            LifecycleState::Opening => {
                drop(cell);
                invariant_violation(component, "close requested while opening");
            }
            other => {
                log::debug!("Close of component '{}' ignored (state: {})", component.name(), other);
                return CloseClaim::Idle;
            }
        }
    };

    if fire_pre_close {
        component.handlers().pre_close(component);
        component.component().notifications.fire_pre_close(component);
    }
    CloseClaim::Claimed
}

fn wait_for_other_close(component: &ComponentView<'_>) {
    let inner = component.component();
    let mut cell = inner.lifecycle();
    log::debug!("Component '{}' is already closing; waiting", component.name());
    while cell.close_in_progress {
        cell = inner.close_done.wait(cell).unwrap_or_else(PoisonError::into_inner);
    }
}

/// Wake callers waiting in [`close`] or [`close_async`] for another close
fn signal_close_done(component: &ComponentView<'_>) {
    let inner = component.component();
    inner.close_done.notify_all();
    inner.close_done_async.notify_waiters();
}

/// Rolls back a claimed close whose drain never completed
struct AbandonOnDrop<'a, 'b> {
    component: &'b ComponentView<'a>,
    armed: bool,
}

impl Drop for AbandonOnDrop<'_, '_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let inner = self.component.component();
        inner.rundown.cancel_drain();
        inner.lifecycle().close_in_progress = false;
        log::warn!(
            "Close of component '{}' abandoned before its references drained",
            self.component.name()
        );
        signal_close_done(self.component);
    }
}

fn finish_close(component: &ComponentView<'_>) {
    let inner = component.component();
    inner.lifecycle().state = LifecycleState::Closing;
    component.handlers().close(component);
    {
        let mut cell = inner.lifecycle();
        cell.state = LifecycleState::Closed;
        cell.close_in_progress = false;
        cell.pre_close_fired = false;
    }
    inner.deletable.store(true, Ordering::SeqCst);
    log::info!("Component '{}' closed", component.name());
    signal_close_done(component);
}
