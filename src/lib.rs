//! sysgate - system call layer for a teaching kernel
//!
//! Sits between the trap entry and the rest of the kernel: validates every
//! user-supplied address, decodes the request, and runs it against the
//! calling process's descriptors and the filesystem, console and process
//! collaborators the embedding kernel provides.
//!
//! # Security Features
//! - No user byte is touched before its page has been checked
//! - Per-process descriptor tables; descriptors are never reused
//! - Exit releases every resource a process holds, exactly once
//!
//! # Architecture
//! - ABI: 32-bit x86, arguments on the user stack, result in `eax`
//! - `no_std` + `alloc`; the embedding kernel supplies the heap
//! - Collaborators are traits ([`kernel::Platform`], [`mm::AddressSpace`])

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod config;
pub mod drivers;
pub mod fd;
pub mod fs;
pub mod kernel;
pub mod logger;
pub mod mm;
pub mod proc;
pub mod sync;
pub mod syscall;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use kernel::{Kernel, LoadError, Platform, SpawnError};
pub use syscall::{Disposition, TrapFrame};
