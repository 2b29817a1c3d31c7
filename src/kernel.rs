//! Kernel Context
//!
//! Everything a syscall runs against, passed explicitly instead of reached
//! through globals: the platform collaborators, the process table and the
//! exit/wait registry.
//!
//! # Process lifecycle
//! ```text
//! spawn:  open image -> allocate pid -> register in table + wait slot -> load
//! exit:   record status -> message -> teardown -> orphan children
//!         -> signal parent -> drop from table
//! ```

use alloc::sync::Arc;
use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU32, Ordering};

use log::{debug, info};

use crate::config::Config;
use crate::drivers::{Console, ConsoleWriter};
use crate::fs::FileSystem;
use crate::mm::AddressSpace;
use crate::proc::{Pid, Process, ProcessTable, WaitError, WaitRegistry};
use crate::sync::Parker;
use crate::syscall::{Disposition, TrapFrame};

/// First pid handed out.
const FIRST_PID: u32 = 1;

/// The loader could not start a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadError;

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program failed to load")
    }
}

/// Why a process could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// The command line has no program name.
    InvalidCommandLine,
    /// The program file does not exist.
    ProgramNotFound,
    /// The loader rejected the program.
    LoadFailed,
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCommandLine => write!(f, "empty command line"),
            Self::ProgramNotFound => write!(f, "program not found"),
            Self::LoadFailed => write!(f, "{}", LoadError),
        }
    }
}

/// Collaborators the syscall layer consumes but does not implement.
pub trait Platform: Sync {
    /// The filesystem.
    fn filesystem(&self) -> &dyn FileSystem;

    /// The console behind descriptors 0 and 1.
    fn console(&self) -> &dyn Console;

    /// Thread block/unblock.
    fn parker(&self) -> &dyn Parker;

    /// Create a thread running `cmdline` for `child` and block until its
    /// program is loaded.
    fn load(&self, child: &Arc<Process>, cmdline: &str) -> Result<(), LoadError>;

    /// End the calling thread. Its process has already been torn down.
    fn exit_thread(&self) -> !;

    /// Power the machine off.
    fn power_off(&self) -> !;
}

/// First whitespace-delimited token of a command line.
pub fn program_name(cmdline: &str) -> Option<&str> {
    cmdline.split_ascii_whitespace().next()
}

/// The syscall layer's view of the kernel.
pub struct Kernel<P: Platform> {
    platform: P,
    config: Config,
    processes: ProcessTable,
    waits: WaitRegistry,
    next_pid: AtomicU32,
}

impl<P: Platform> Kernel<P> {
    /// Create a kernel with no processes.
    pub fn new(platform: P, config: Config) -> Self {
        Self {
            platform,
            config,
            processes: ProcessTable::new(),
            waits: WaitRegistry::new(),
            next_pid: AtomicU32::new(FIRST_PID),
        }
    }

    /// The platform collaborators.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Boot configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Look up a live process.
    pub fn process(&self, pid: Pid) -> Option<Arc<Process>> {
        self.processes.get(pid)
    }

    /// Number of live processes.
    pub fn process_count(&self) -> usize {
        self.processes.count()
    }

    fn allocate_pid(&self) -> Pid {
        Pid::new(self.next_pid.fetch_add(1, Ordering::Relaxed))
    }

    /// Start the first, parentless process.
    pub fn spawn_initial(&self, cmdline: &str) -> Result<Arc<Process>, SpawnError> {
        self.spawn(None, cmdline)
    }

    /// Create a process running `cmdline`.
    ///
    /// The program name is looked up on its own; the loader receives the
    /// whole command line. The child is registered for `wait` before it can
    /// run, and rolled back if loading fails.
    pub fn spawn(
        &self,
        parent: Option<&Arc<Process>>,
        cmdline: &str,
    ) -> Result<Arc<Process>, SpawnError> {
        let name = program_name(cmdline).ok_or(SpawnError::InvalidCommandLine)?;
        let image = self
            .platform
            .filesystem()
            .open(name)
            .ok_or(SpawnError::ProgramNotFound)?;

        let pid = self.allocate_pid();
        let child = Arc::new(Process::new(
            pid,
            name,
            parent.map(|parent| parent.pid()),
            self.config.max_open_files,
        ));
        child.set_executable(image);

        self.processes.insert(Arc::clone(&child));
        if let Some(parent) = parent {
            self.waits.register(parent.pid(), pid);
        }

        if let Err(err) = self.platform.load(&child, cmdline) {
            debug!("pid {}: {}", pid, err);
            self.waits.unregister(pid);
            self.processes.remove(pid);
            child.teardown();
            return Err(SpawnError::LoadFailed);
        }

        info!("spawned pid {} ({})", pid, name);
        Ok(child)
    }

    /// Block until `child` of `parent` exits and return its status.
    pub fn wait(&self, parent: &Process, child: Pid) -> Result<i32, WaitError> {
        self.waits.wait(parent.pid(), child, self.platform.parker())
    }

    /// Terminate `process` with `status`.
    ///
    /// Safe to call more than once; only the first call has any effect.
    pub fn exit(&self, process: &Process, status: i32) {
        if !process.record_exit(status) {
            return;
        }
        let pid = process.pid();

        if self.config.print_exit_message {
            let mut console = ConsoleWriter::new(self.platform.console());
            let _ = writeln!(console, "{}: exit({})", process.name(), status);
        }

        let released = process.teardown();
        self.waits.forget_children(pid);
        self.waits.notify_exit(pid, status, self.platform.parker());
        self.processes.remove(pid);
        debug!(
            "pid {} exited with {} ({} descriptors released)",
            pid, status, released
        );
    }

    /// Trap entry: service one syscall for `process`.
    ///
    /// Returns only if the process resumes in user mode.
    pub fn handle_trap<S>(&self, process: &Arc<Process>, frame: &mut TrapFrame, space: &S)
    where
        S: AddressSpace + ?Sized,
    {
        match self.dispatch(process, frame, space) {
            Disposition::Resume => {}
            Disposition::Terminated(_) => self.platform.exit_thread(),
            Disposition::PowerOff => {
                info!("power off requested by pid {}", process.pid());
                self.platform.power_off()
            }
        }
    }
}
