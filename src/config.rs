//! Kernel configuration for the syscall layer.

use log::LevelFilter;

/// Default bound on live descriptors per process.
pub const DEFAULT_MAX_OPEN_FILES: usize = 128;

/// Tunables fixed at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Live descriptors one process may hold before `open` fails.
    pub max_open_files: usize,
    /// Print `"<name>: exit(<status>)"` on the console when a process ends.
    pub print_exit_message: bool,
    /// Maximum level passed to the kernel logger.
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_open_files: DEFAULT_MAX_OPEN_FILES,
            print_exit_message: true,
            log_level: LevelFilter::Info,
        }
    }
}
