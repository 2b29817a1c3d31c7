//! Console Interface
//!
//! The teletype the kernel talks to on descriptors 0 and 1. The device
//! driver behind it is an external collaborator.

use core::fmt;

/// Byte-oriented console device.
pub trait Console: Sync {
    /// Block until one byte of input is available and return it.
    fn read_byte(&self) -> u8;

    /// Write all of `bytes`. Always accepts the whole buffer.
    fn write_bytes(&self, bytes: &[u8]);
}

/// `core::fmt::Write` adaptor over a [`Console`].
pub struct ConsoleWriter<'a> {
    console: &'a dyn Console,
}

impl<'a> ConsoleWriter<'a> {
    /// Wrap a console.
    pub fn new(console: &'a dyn Console) -> Self {
        Self { console }
    }
}

impl fmt::Write for ConsoleWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.console.write_bytes(s.as_bytes());
        Ok(())
    }
}
