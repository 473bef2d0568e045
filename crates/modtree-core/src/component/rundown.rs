//! Reference counting and rundown.
//!
//! An open component holds a baseline reference. Methods bracket their
//! work with [`Rundown::acquire`] / [`Rundown::release`]; a close marks
//! the rundown pending, refuses new references and waits until only the
//! baseline remains before it resets the count to zero.
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

use crate::kernel::constants::OPEN_REFERENCE_BASELINE;

/// How a drain waits for outstanding references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RundownWait {
    /// Woken by the release that brings the count back to the baseline
    #[default]
    Notify,
    /// Re-check the count at a fixed interval
    Poll(Duration),
}

#[derive(Debug, Default)]
struct RundownState {
    references: u32,
    close_pending: bool,
}

pub struct Rundown {
    state: Mutex<RundownState>,
    drained: Condvar,
    drained_async: Notify,
    wait: RundownWait,
}

impl Rundown {
    pub fn new(wait: RundownWait) -> Self {
        Self {
            state: Mutex::new(RundownState::default()),
            drained: Condvar::new(),
            drained_async: Notify::new(),
            wait,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RundownState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn wait_mode(&self) -> RundownWait {
        self.wait
    }

    pub fn reference_count(&self) -> u32 {
        self.lock_state().references
    }

    pub fn is_close_pending(&self) -> bool {
        self.lock_state().close_pending
    }

    /// Install the baseline reference after a successful open
    pub fn seed(&self) {
        let mut state = self.lock_state();
        if state.references != 0 {
            panic!(
                "rundown seeded while {} references are outstanding",
                state.references
            );
        }
        state.references = OPEN_REFERENCE_BASELINE;
        state.close_pending = false;
    }

    /// Take a reference; fails when not open or when a close is pending
    pub fn acquire(&self) -> bool {
        let mut state = self.lock_state();
        if state.references < OPEN_REFERENCE_BASELINE || state.close_pending {
            return false;
        }
        state.references = match state.references.checked_add(1) {
            Some(count) => count,
            None => panic!("rundown reference count overflow"),
        };
        true
    }

    /// Drop a reference taken by a successful [`acquire`](Self::acquire)
    pub fn release(&self) {
        let mut state = self.lock_state();
        if state.references <= OPEN_REFERENCE_BASELINE {
            panic!(
                "rundown release without a matching acquire (count {})",
                state.references
            );
        }
        state.references -= 1;
        if state.references == OPEN_REFERENCE_BASELINE && state.close_pending {
            self.drained.notify_all();
            self.drained_async.notify_waiters();
        }
    }

    /// Mark close pending, block until only the baseline reference is left,
    /// then reset the count to zero.
    pub fn drain_and_wait(&self) {
        let mut state = self.lock_state();
        state.close_pending = true;
        while state.references > OPEN_REFERENCE_BASELINE {
            log::trace!("Rundown waiting on {} references", state.references - OPEN_REFERENCE_BASELINE);
            state = match self.wait {
                RundownWait::Notify => self.drained.wait(state).unwrap_or_else(PoisonError::into_inner),
                RundownWait::Poll(interval) => {
                    drop(state);
                    std::thread::sleep(interval);
                    self.lock_state()
                }
            };
        }
        Self::complete(&mut state);
    }

    /// Async counterpart of [`drain_and_wait`](Self::drain_and_wait).
    ///
    /// The polling mode uses `tokio::time` and therefore needs a Tokio runtime.
    pub async fn drain_and_wait_async(&self) {
        self.lock_state().close_pending = true;
        loop {
            let notified = self.drained_async.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.try_complete() {
                return;
            }
            match self.wait {
                RundownWait::Notify => notified.await,
                RundownWait::Poll(interval) => tokio::time::sleep(interval).await,
            }
        }
    }

    /// Withdraw a drain that will not be completed; references are
    /// accepted again.
    pub fn cancel_drain(&self) {
        let mut state = self.lock_state();
        if state.close_pending && state.references >= OPEN_REFERENCE_BASELINE {
            state.close_pending = false;
            log::debug!("Rundown cancelled with {} references outstanding", state.references);
        }
    }

    fn try_complete(&self) -> bool {
        let mut state = self.lock_state();
        if state.references > OPEN_REFERENCE_BASELINE {
            return false;
        }
        Self::complete(&mut state);
        true
    }

    fn complete(state: &mut RundownState) {
        if state.references != OPEN_REFERENCE_BASELINE {
            panic!("rundown drained with unexpected count {}", state.references);
        }
        state.references = 0;
        state.close_pending = false;
    }
}

impl Default for Rundown {
    fn default() -> Self {
        Self::new(RundownWait::default())
    }
}

impl fmt::Debug for Rundown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("Rundown")
            .field("references", &state.references)
            .field("close_pending", &state.close_pending)
            .field("wait", &self.wait)
            .finish()
    }
}
