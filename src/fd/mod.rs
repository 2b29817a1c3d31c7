//! Per-process file descriptors
//!
//! Each process owns one [`FdTable`]; nothing else mutates it.

pub mod table;

pub use table::{Fd, FdError, FdTable};
