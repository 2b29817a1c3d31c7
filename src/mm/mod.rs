//! Memory management interface for the syscall layer
//!
//! Provides:
//! - Typed user virtual addresses
//! - The address space query the validator runs against
//!
//! Page tables and frame allocation live in the VM subsystem; nothing here
//! modifies a mapping.

pub mod address;
pub mod space;

pub use address::{VirtAddr, PAGE_SIZE, USER_TOP};
pub use space::{AddressSpace, PageFlags, Translation};
