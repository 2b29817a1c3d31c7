//! Exit/Wait Synchronization
//!
//! Every child gets its own slot, keyed by the child's pid and tagged with
//! its parent, so a parent with several outstanding children never picks up
//! the wrong exit.
//!
//! # Slot lifecycle
//! ```text
//! register(parent, child)        slot created, status unset
//! notify_exit(child, status)     status set once, semaphore raised
//! wait(parent, child)            claims slot, blocks on semaphore,
//!                                reads status, removes slot
//! forget_children(parent)        parent exited: its slots are dropped,
//!                                children exit without signalling
//! ```

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use spin::{Mutex, Once};

use super::process::Pid;
use crate::syscall::abi::EXIT_FAILURE;
use crate::sync::{Parker, Semaphore};

/// Why a wait was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The pid is not a live or unreaped child of the caller.
    NotChild(Pid),
    /// The caller is already waiting on this child.
    AlreadyWaited(Pid),
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotChild(pid) => write!(f, "pid {} is not a waitable child", pid),
            Self::AlreadyWaited(pid) => write!(f, "pid {} is already being waited on", pid),
        }
    }
}

struct ChildSlot {
    parent: Pid,
    status: Once<i32>,
    exited: Semaphore,
    claimed: AtomicBool,
}

/// Per-(parent, child) exit slots.
pub struct WaitRegistry {
    slots: Mutex<BTreeMap<Pid, Arc<ChildSlot>>>,
}

impl WaitRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(BTreeMap::new()),
        }
    }

    /// Open a slot for a freshly created child.
    pub fn register(&self, parent: Pid, child: Pid) {
        let slot = ChildSlot {
            parent,
            status: Once::new(),
            exited: Semaphore::new(0),
            claimed: AtomicBool::new(false),
        };
        self.slots.lock().insert(child, Arc::new(slot));
    }

    /// Drop a child's slot without signalling (the child never started).
    pub fn unregister(&self, child: Pid) {
        self.slots.lock().remove(&child);
    }

    /// Publish a child's exit status and release a waiting parent.
    ///
    /// Returns `false` if nobody can wait for this child (orphan or no
    /// parent).
    pub fn notify_exit(&self, child: Pid, status: i32, parker: &dyn Parker) -> bool {
        let slot = match self.slots.lock().get(&child) {
            Some(slot) => Arc::clone(slot),
            None => return false,
        };
        slot.status.call_once(|| status);
        slot.exited.up(parker);
        true
    }

    /// Drop every slot owned by an exiting parent.
    pub fn forget_children(&self, parent: Pid) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|_, slot| slot.parent != parent);
        before - slots.len()
    }

    /// Block until `child` exits and return its status.
    ///
    /// Fails without blocking if `child` is not an unreaped child of
    /// `parent`. Each child can be reaped once.
    pub fn wait(&self, parent: Pid, child: Pid, parker: &dyn Parker) -> Result<i32, WaitError> {
        let slot = match self.slots.lock().get(&child) {
            Some(slot) if slot.parent == parent => Arc::clone(slot),
            _ => return Err(WaitError::NotChild(child)),
        };
        if slot.claimed.swap(true, Ordering::AcqRel) {
            return Err(WaitError::AlreadyWaited(child));
        }

        slot.exited.down(parker);
        let status = slot.status.get().copied().unwrap_or(EXIT_FAILURE);
        self.slots.lock().remove(&child);
        Ok(status)
    }
}

impl Default for WaitRegistry {
    fn default() -> Self {
        Self::new()
    }
}
