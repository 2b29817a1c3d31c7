//! Device interfaces used by the syscall layer
//!
//! All drivers follow these security principles:
//! - The kernel only ever hands them already-validated kernel buffers
//! - No panics on any input

pub mod console;

pub use console::{Console, ConsoleWriter};
