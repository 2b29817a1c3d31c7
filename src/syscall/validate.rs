//! System Call Input Validation
//!
//! Every address that reaches the kernel from a trap frame is checked here
//! before a single byte behind it is touched.
//!
//! # Security Principles
//! - Validate ALL inputs before use, including the stack slots that hold them
//! - Fail-secure: a bad address is a fault, never a recoverable error
//! - Every page a range touches is checked, not just the first word
//! - Strings are copied into kernel memory (no TOCTOU on names)

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::mm::{AddressSpace, PageFlags, VirtAddr};

/// Width in bytes of one argument slot on the user stack.
pub const WORD_SIZE: usize = 4;

/// Why a user address was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFault {
    /// The address was null.
    Null,
    /// The address lies outside the user region.
    OutsideUserRegion(VirtAddr),
    /// No present user mapping backs the address.
    Unmapped(VirtAddr),
    /// The kernel needed to write to a read-only page.
    ReadOnly(VirtAddr),
    /// The range wraps around the end of the address space.
    Overflow(VirtAddr),
}

impl fmt::Display for UserFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null user pointer"),
            Self::OutsideUserRegion(addr) => write!(f, "{} is outside the user region", addr),
            Self::Unmapped(addr) => write!(f, "{} is not mapped", addr),
            Self::ReadOnly(addr) => write!(f, "{} is not writable", addr),
            Self::Overflow(addr) => write!(f, "range at {} overflows", addr),
        }
    }
}

/// How the kernel is going to touch validated memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Copy from user memory.
    Read,
    /// Copy into user memory.
    Write,
}

/// Check a single user byte and return its kernel alias.
///
/// # Security Checks
/// 1. Address is non-null
/// 2. Address is within the user region
/// 3. A present user mapping backs it
/// 4. The mapping is writable, if the kernel is going to write
pub fn check_byte<S>(space: &S, addr: VirtAddr, access: Access) -> Result<NonNull<u8>, UserFault>
where
    S: AddressSpace + ?Sized,
{
    if addr.is_null() {
        return Err(UserFault::Null);
    }
    if !space.is_user_region(addr) {
        return Err(UserFault::OutsideUserRegion(addr));
    }

    let translation = space.translate(addr).ok_or(UserFault::Unmapped(addr))?;
    if !translation.flags.contains(PageFlags::PRESENT | PageFlags::USER) {
        return Err(UserFault::Unmapped(addr));
    }
    if access == Access::Write && !translation.flags.contains(PageFlags::WRITABLE) {
        return Err(UserFault::ReadOnly(addr));
    }

    Ok(translation.alias)
}

/// A page-bounded piece of a validated range.
#[derive(Clone, Copy)]
struct Segment {
    ptr: NonNull<u8>,
    len: usize,
}

/// Validate `[addr, addr + len)` one page at a time.
fn collect_segments<S>(
    space: &S,
    addr: VirtAddr,
    len: usize,
    access: Access,
) -> Result<Vec<Segment>, UserFault>
where
    S: AddressSpace + ?Sized,
{
    if addr.is_null() {
        return Err(UserFault::Null);
    }
    if len > 0 {
        addr.checked_add(len - 1).ok_or(UserFault::Overflow(addr))?;
    }

    let mut segments = Vec::new();
    let mut cursor = addr;
    let mut remaining = len;
    while remaining > 0 {
        let ptr = check_byte(space, cursor, access)?;
        let chunk = remaining.min(cursor.bytes_to_page_end());
        segments.push(Segment { ptr, len: chunk });
        remaining -= chunk;
        if remaining > 0 {
            cursor = cursor.checked_add(chunk).ok_or(UserFault::Overflow(addr))?;
        }
    }
    Ok(segments)
}

/// A validated user-space buffer the kernel reads from.
///
/// This type guarantees that:
/// - The buffer start is non-null
/// - Every page of the buffer is mapped and user-accessible
/// - The length doesn't overflow
pub struct UserBuffer<'a> {
    segments: Vec<Segment>,
    len: usize,
    _space: PhantomData<&'a ()>,
}

impl UserBuffer<'_> {
    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Visit each page-bounded piece in order until `f` returns `false`.
    pub fn for_each_segment(&self, mut f: impl FnMut(&[u8]) -> bool) {
        for segment in &self.segments {
            // SAFETY: The segment was produced by `collect_segments`, which
            // translated its first byte; the `AddressSpace` contract keeps the
            // alias valid up to the page end for the lifetime `'a`.
            let bytes = unsafe { core::slice::from_raw_parts(segment.ptr.as_ptr(), segment.len) };
            if !f(bytes) {
                break;
            }
        }
    }

    /// Copy the whole buffer into kernel memory.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        self.for_each_segment(|bytes| {
            out.extend_from_slice(bytes);
            true
        });
        out
    }
}

impl fmt::Debug for UserBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserBuffer(len={}, pages={})", self.len, self.segments.len())
    }
}

/// A validated mutable user-space buffer the kernel writes into.
pub struct UserBufferMut<'a> {
    segments: Vec<Segment>,
    len: usize,
    _space: PhantomData<&'a ()>,
}

impl UserBufferMut<'_> {
    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Visit each page-bounded piece mutably until `f` returns `false`.
    ///
    /// Only one piece is borrowed at a time, so two user pages aliasing the
    /// same frame never produce overlapping `&mut` slices.
    pub fn for_each_segment_mut(&mut self, mut f: impl FnMut(&mut [u8]) -> bool) {
        for segment in &self.segments {
            // SAFETY: As for `UserBuffer::for_each_segment`; the page was also
            // checked for `WRITABLE`, and the slice does not outlive this call.
            let bytes =
                unsafe { core::slice::from_raw_parts_mut(segment.ptr.as_ptr(), segment.len) };
            if !f(bytes) {
                break;
            }
        }
    }

    /// Store one byte at the start of the buffer.
    ///
    /// Returns `false` if the buffer is empty.
    pub fn put_first(&mut self, byte: u8) -> bool {
        let mut stored = false;
        self.for_each_segment_mut(|bytes| {
            if let Some(first) = bytes.first_mut() {
                *first = byte;
                stored = true;
            }
            false
        });
        stored
    }
}

impl fmt::Debug for UserBufferMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserBufferMut(len={}, pages={})", self.len, self.segments.len())
    }
}

/// A null-terminated user string, copied into kernel memory.
///
/// The terminator is not included.
#[derive(Clone, PartialEq, Eq)]
pub struct UserString(Vec<u8>);

impl UserString {
    /// Raw bytes, without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The string as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.0).ok()
    }

    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for UserString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

/// Validate a user-space read buffer
///
/// # Returns
/// * `Ok(UserBuffer)` - Validated buffer handle
/// * `Err(UserFault)` - Validation failed
///
/// A null `ptr` is rejected even for a zero-length buffer.
pub fn validate_user_read<S>(space: &S, ptr: VirtAddr, len: usize) -> Result<UserBuffer<'_>, UserFault>
where
    S: AddressSpace + ?Sized,
{
    let segments = collect_segments(space, ptr, len, Access::Read)?;
    Ok(UserBuffer {
        segments,
        len,
        _space: PhantomData,
    })
}

/// Validate a user-space write buffer
///
/// Same as read validation, plus every page must be writable.
pub fn validate_user_write<S>(
    space: &S,
    ptr: VirtAddr,
    len: usize,
) -> Result<UserBufferMut<'_>, UserFault>
where
    S: AddressSpace + ?Sized,
{
    let segments = collect_segments(space, ptr, len, Access::Write)?;
    Ok(UserBufferMut {
        segments,
        len,
        _space: PhantomData,
    })
}

/// Read one little-endian word from user memory.
///
/// The word may straddle a page boundary; both pages are checked.
pub fn read_word<S>(space: &S, addr: VirtAddr) -> Result<u32, UserFault>
where
    S: AddressSpace + ?Sized,
{
    let buf = validate_user_read(space, addr, WORD_SIZE)?;
    let mut word = [0u8; WORD_SIZE];
    let mut filled = 0;
    buf.for_each_segment(|bytes| {
        word[filled..filled + bytes.len()].copy_from_slice(bytes);
        filled += bytes.len();
        true
    });
    Ok(u32::from_le_bytes(word))
}

/// Copy a null-terminated string out of user memory.
///
/// Every byte up to and including the terminator is validated; a string
/// that runs into an unmapped page or out of the user region faults.
pub fn read_cstr<S>(space: &S, addr: VirtAddr) -> Result<UserString, UserFault>
where
    S: AddressSpace + ?Sized,
{
    let mut out = Vec::new();
    let mut cursor = addr;
    loop {
        let ptr = check_byte(space, cursor, Access::Read)?;
        let chunk = cursor.bytes_to_page_end();
        // SAFETY: `check_byte` translated `cursor`; the alias is valid to the
        // end of its page per the `AddressSpace` contract.
        let page = unsafe { core::slice::from_raw_parts(ptr.as_ptr(), chunk) };
        if let Some(nul) = page.iter().position(|&b| b == 0) {
            out.extend_from_slice(&page[..nul]);
            return Ok(UserString(out));
        }
        out.extend_from_slice(page);
        cursor = cursor.checked_add(chunk).ok_or(UserFault::Overflow(addr))?;
    }
}
