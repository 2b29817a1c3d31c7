//! Process
//!
//! One running program: its id, parent link, write-once exit status and the
//! resources it owns. Teardown releases all of them exactly once.

use alloc::string::String;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use spin::{Mutex, MutexGuard, Once};

use crate::fd::FdTable;
use crate::fs::FileHandle;

/// A process identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Pid(u32);

impl Pid {
    /// Wrap a raw id.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Interpret a pid argument from user code. Negative values name nothing.
    #[inline]
    pub fn from_user(raw: i32) -> Option<Self> {
        u32::try_from(raw).ok().map(Self)
    }

    /// Get the raw value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// The value returned to user code.
    #[inline]
    pub fn as_user(self) -> i32 {
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A running program instance.
pub struct Process {
    pid: Pid,
    /// Program name, used in the termination message.
    name: String,
    parent: Option<Pid>,
    /// Only the owning thread touches this; the lock makes that explicit.
    files: Mutex<FdTable<FileHandle>>,
    /// Handle on the program image, write-denied while the process lives.
    executable: Mutex<Option<FileHandle>>,
    exit_status: Once<i32>,
    torn_down: AtomicBool,
}

impl Process {
    /// Create a process record.
    pub fn new(pid: Pid, name: &str, parent: Option<Pid>, max_open_files: usize) -> Self {
        Self {
            pid,
            name: String::from(name),
            parent,
            files: Mutex::new(FdTable::new(max_open_files)),
            executable: Mutex::new(None),
            exit_status: Once::new(),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Process id.
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Program name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent process, if any.
    #[inline]
    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }

    /// Exit status, once the process has exited.
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status.get().copied()
    }

    /// The descriptor table.
    pub fn files(&self) -> MutexGuard<'_, FdTable<FileHandle>> {
        self.files.lock()
    }

    /// Bind the program image handle. Writes to it stay denied until teardown.
    pub fn set_executable(&self, mut file: FileHandle) {
        file.deny_write();
        if let Some(mut previous) = self.executable.lock().replace(file) {
            previous.allow_write();
        }
    }

    /// Record the exit status.
    ///
    /// Returns `false` if a status was already recorded; the first one wins.
    pub fn record_exit(&self, status: i32) -> bool {
        let mut recorded = false;
        self.exit_status.call_once(|| {
            recorded = true;
            status
        });
        recorded
    }

    /// Release every resource the process owns.
    ///
    /// Runs at most once; later calls do nothing and return 0. Returns the
    /// number of descriptors that were still open.
    pub fn teardown(&self) -> usize {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return 0;
        }
        let closed = self.files.lock().close_all();
        if let Some(mut image) = self.executable.lock().take() {
            image.allow_write();
        }
        closed
    }

    /// Whether teardown has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("exit_status", &self.exit_status())
            .finish()
    }
}
