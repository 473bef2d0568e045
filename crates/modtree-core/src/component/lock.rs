//! Component locks.
//!
//! Each component owns one default lock plus the auxiliary locks its
//! descriptor asks for. The primitive follows the descriptor's execution
//! ceiling: a blocking mutex for passive components, a spin lock for
//! dispatch-level ones. Locks guard short, non-recursive critical
//! sections and are never held across a call into another component.
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    Blocking,
    Spin,
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKind::Blocking => write!(f, "blocking"),
            LockKind::Spin => write!(f, "spin"),
        }
    }
}

pub trait ComponentLock: Send + Sync + fmt::Debug {
    fn kind(&self) -> LockKind;

    /// Acquire the lock; released when the guard drops
    fn acquire(&self) -> LockGuard<'_>;

    /// Thread currently holding the lock (debug builds only)
    fn owner(&self) -> Option<ThreadId>;
}

/// Owning-thread bookkeeping, compiled out of release builds
#[derive(Debug, Default)]
struct OwnerSlot {
    #[cfg(debug_assertions)]
    owner: spin::Mutex<Option<ThreadId>>,
}

impl OwnerSlot {
    fn get(&self) -> Option<ThreadId> {
        #[cfg(debug_assertions)]
        {
            *self.owner.lock()
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    }

    fn assert_not_held_by_current(&self, kind: LockKind) {
        debug_assert!(
            self.get() != Some(thread::current().id()),
            "recursive acquisition of a {} component lock",
            kind
        );
    }

    fn claim(&self) {
        #[cfg(debug_assertions)]
        {
            *self.owner.lock() = Some(thread::current().id());
        }
    }

    fn clear(&self) {
        #[cfg(debug_assertions)]
        {
            *self.owner.lock() = None;
        }
    }
}

enum Held<'a> {
    Blocking(#[allow(dead_code)] MutexGuard<'a, ()>),
    Spin(#[allow(dead_code)] spin::MutexGuard<'a, ()>),
}

/// RAII guard returned by [`ComponentLock::acquire`]
pub struct LockGuard<'a> {
    owner: &'a OwnerSlot,
    held: Option<Held<'a>>,
}

impl LockGuard<'_> {
    pub fn kind(&self) -> LockKind {
        match self.held {
            Some(Held::Blocking(_)) | None => LockKind::Blocking,
            Some(Held::Spin(_)) => LockKind::Spin,
        }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        // Clear the owner while the primitive is still held.
        self.owner.clear();
        self.held.take();
    }
}

impl fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").field("kind", &self.kind()).finish()
    }
}

/// Lock for components that may block
#[derive(Debug, Default)]
pub struct BlockingLock {
    inner: Mutex<()>,
    owner: OwnerSlot,
}

impl ComponentLock for BlockingLock {
    fn kind(&self) -> LockKind {
        LockKind::Blocking
    }

    fn acquire(&self) -> LockGuard<'_> {
        self.owner.assert_not_held_by_current(LockKind::Blocking);
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        self.owner.claim();
        LockGuard {
            owner: &self.owner,
            held: Some(Held::Blocking(guard)),
        }
    }

    fn owner(&self) -> Option<ThreadId> {
        self.owner.get()
    }
}

/// Lock for components running at dispatch level
#[derive(Debug, Default)]
pub struct SpinLock {
    inner: spin::Mutex<()>,
    owner: OwnerSlot,
}

impl ComponentLock for SpinLock {
    fn kind(&self) -> LockKind {
        LockKind::Spin
    }

    fn acquire(&self) -> LockGuard<'_> {
        self.owner.assert_not_held_by_current(LockKind::Spin);
        let guard = self.inner.lock();
        self.owner.claim();
        LockGuard {
            owner: &self.owner,
            held: Some(Held::Spin(guard)),
        }
    }

    fn owner(&self) -> Option<ThreadId> {
        self.owner.get()
    }
}

pub fn new_lock(kind: LockKind) -> Box<dyn ComponentLock> {
    match kind {
        LockKind::Blocking => Box::new(BlockingLock::default()),
        LockKind::Spin => Box::new(SpinLock::default()),
    }
}
