//! Virtual Address Types
//!
//! Type-safe wrapper for user-supplied addresses so that raw integers read
//! out of a trap frame cannot be confused with kernel pointers.
//!
//! # Security Properties
//! - A `VirtAddr` can never be dereferenced directly
//! - Arithmetic is checked; wrapping past the end of the address space is an error
//! - The user region test is a single comparison against `USER_TOP`

use core::fmt;

/// Page size (4 KiB)
pub const PAGE_SIZE: usize = 4096;
/// Page size mask
pub const PAGE_MASK: usize = PAGE_SIZE - 1;
/// Bits to shift for page number
pub const PAGE_SHIFT: usize = 12;

/// First address above the user region.
///
/// Everything at or above this address belongs to the kernel.
pub const USER_TOP: usize = 0xC000_0000;

/// A user virtual address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VirtAddr(usize);

impl VirtAddr {
    /// The null address.
    pub const NULL: Self = Self(0);

    /// Wrap a raw address.
    #[inline]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Check for the null address.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Get the page offset (lowest 12 bits).
    #[inline]
    pub const fn page_offset(self) -> usize {
        self.0 & PAGE_MASK
    }

    /// Get the virtual page number.
    #[inline]
    pub const fn page_number(self) -> usize {
        self.0 >> PAGE_SHIFT
    }

    /// Bytes from this address to the end of its page.
    #[inline]
    pub const fn bytes_to_page_end(self) -> usize {
        PAGE_SIZE - self.page_offset()
    }

    /// Add an offset to this address, failing on overflow.
    #[inline]
    pub const fn checked_add(self, offset: usize) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }

    /// Check if this is a user address.
    #[inline]
    pub const fn is_user(self) -> bool {
        self.0 < USER_TOP
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr({:#010x})", self.0)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
