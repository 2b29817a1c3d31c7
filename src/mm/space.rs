//! Address Space Query Interface
//!
//! The page tables themselves are owned by the VM subsystem. The syscall
//! layer only needs to ask two questions about the calling process's active
//! mapping: is an address inside the user region, and which kernel alias (if
//! any) backs it.

use core::ptr::NonNull;

use bitflags::bitflags;

use super::address::VirtAddr;

bitflags! {
    /// Permissions of a present user mapping.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFlags: u8 {
        /// A frame backs the page.
        const PRESENT = 1 << 0;
        /// User code may write the page.
        const WRITABLE = 1 << 1;
        /// User code may access the page at all.
        const USER = 1 << 2;
    }
}

/// Result of translating one user address.
#[derive(Debug, Clone, Copy)]
pub struct Translation {
    /// Kernel-accessible alias of the translated byte.
    pub alias: NonNull<u8>,
    /// Permissions of the page holding the byte.
    pub flags: PageFlags,
}

/// The calling process's address space, as seen from the syscall layer.
///
/// # Safety
/// Implementors guarantee that when `translate(addr)` returns a
/// translation, `alias` is valid for reads (and, if `WRITABLE` is set,
/// writes) of every byte from `addr` up to the end of its page, for as long
/// as the `&self` borrow is held. The syscall layer builds slices out of
/// these aliases.
pub unsafe trait AddressSpace {
    /// Is `addr` inside the region user code may address directly?
    fn is_user_region(&self, addr: VirtAddr) -> bool {
        addr.is_user()
    }

    /// Look up the present mapping for `addr`, if any.
    fn translate(&self, addr: VirtAddr) -> Option<Translation>;
}
