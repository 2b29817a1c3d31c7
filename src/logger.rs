//! Kernel Logger
//!
//! `log` backend that writes every record to the console as
//! `[LEVEL target] message`.
//!
//! # Security Note
//! Log lines go to the same console user programs write to. Nothing logged
//! from the syscall layer includes user buffer contents.

use alloc::string::String;
use core::fmt::Write;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Once;

use crate::drivers::Console;

struct KernelLogger {
    console: Once<&'static dyn Console>,
}

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(console) = self.console.get() {
            // One device write per record keeps concurrent lines whole.
            let mut line = String::new();
            let _ = writeln!(line, "[{} {}] {}", record.level(), record.target(), record.args());
            console.write_bytes(line.as_bytes());
        }
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger {
    console: Once::new(),
};

/// Install the kernel logger.
///
/// Can succeed only once per boot.
pub fn init(console: &'static dyn Console, level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    LOGGER.console.call_once(|| console);
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::MockConsole;

    #[test]
    fn test_init_routes_records_to_console() {
        let console: &'static MockConsole = Box::leak(Box::new(MockConsole::new()));
        init(console, Config::default().log_level).unwrap();

        log::info!(target: "sysgate", "booted");
        log::debug!("filtered out");
        let output = console.output_string();
        assert!(output.contains("[INFO sysgate] booted\n"));
        assert!(!output.contains("filtered out"));

        assert!(init(console, LevelFilter::Trace).is_err());
    }

    #[derive(Default)]
    struct WriteCounter {
        writes: std::sync::Mutex<Vec<Vec<u8>>>,
    }

    impl Console for WriteCounter {
        fn read_byte(&self) -> u8 {
            0
        }

        fn write_bytes(&self, bytes: &[u8]) {
            self.writes.lock().unwrap().push(bytes.to_vec());
        }
    }

    #[test]
    fn test_record_is_one_console_write() {
        let console: &'static WriteCounter = Box::leak(Box::default());
        let logger = KernelLogger {
            console: Once::new(),
        };
        logger.console.call_once(|| console);
        log::set_max_level(Config::default().log_level);

        logger.log(
            &Record::builder()
                .level(log::Level::Warn)
                .target("sysgate::syscall")
                .args(format_args!("pid {}: {}", 3, "null user pointer"))
                .build(),
        );
        let writes = console.writes.lock().unwrap();
        assert_eq!(
            *writes,
            vec![b"[WARN sysgate::syscall] pid 3: null user pointer\n".to_vec()]
        );
    }
}
