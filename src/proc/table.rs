//! Live-process registry.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;

use spin::Mutex;

use super::process::{Pid, Process};

/// All processes that have been created and have not yet exited.
pub struct ProcessTable {
    processes: Mutex<BTreeMap<Pid, Arc<Process>>>,
}

impl ProcessTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            processes: Mutex::new(BTreeMap::new()),
        }
    }

    /// Add a process.
    pub fn insert(&self, process: Arc<Process>) {
        self.processes.lock().insert(process.pid(), process);
    }

    /// Look up a live process.
    pub fn get(&self, pid: Pid) -> Option<Arc<Process>> {
        self.processes.lock().get(&pid).cloned()
    }

    /// Drop a process from the table.
    pub fn remove(&self, pid: Pid) -> Option<Arc<Process>> {
        self.processes.lock().remove(&pid)
    }

    /// Number of live processes.
    pub fn count(&self) -> usize {
        self.processes.lock().len()
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
