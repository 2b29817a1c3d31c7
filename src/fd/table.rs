//! Descriptor Table
//!
//! Per-process map from small integers to open file handles.
//!
//! # Design
//! - Descriptors are handed out in strictly increasing order and never reused
//! - 0 and 1 name the console and never appear in the table
//! - The number of live entries is bounded; hitting the bound is exhaustion
//! - Closing drops the handle, which closes the underlying file

use alloc::collections::BTreeMap;
use core::fmt;

/// A file descriptor as user code sees it.
///
/// This is a newtype to prevent using arbitrary integers as table keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Fd(i32);

impl Fd {
    /// Console input.
    pub const STDIN: Self = Self(0);

    /// Console output.
    pub const STDOUT: Self = Self(1);

    /// First descriptor `open` can return.
    pub const FIRST_FILE: Self = Self(2);

    /// Wrap a raw descriptor from user code.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for descriptor table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdError {
    /// No live entry for the descriptor.
    NotFound(Fd),
    /// The table cannot take another entry.
    Exhausted,
}

impl fmt::Display for FdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(fd) => write!(f, "descriptor {} is not open", fd),
            Self::Exhausted => write!(f, "descriptor table exhausted"),
        }
    }
}

/// Descriptor table for one process.
#[derive(Debug)]
pub struct FdTable<T> {
    /// Live descriptors.
    entries: BTreeMap<Fd, T>,
    /// Next descriptor to hand out.
    next: i32,
    /// Maximum number of live descriptors.
    capacity: usize,
}

impl<T> FdTable<T> {
    /// Create an empty table holding at most `capacity` open files.
    pub const fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            next: Fd::FIRST_FILE.0,
            capacity,
        }
    }

    /// Bind `handle` to a fresh descriptor.
    ///
    /// On failure the handle is dropped, which closes it.
    pub fn open(&mut self, handle: T) -> Result<Fd, FdError> {
        if self.entries.len() >= self.capacity {
            return Err(FdError::Exhausted);
        }
        let fd = Fd(self.next);
        self.next = self.next.checked_add(1).ok_or(FdError::Exhausted)?;
        self.entries.insert(fd, handle);
        Ok(fd)
    }

    /// Look up an open descriptor.
    #[inline]
    pub fn lookup(&self, fd: Fd) -> Result<&T, FdError> {
        self.entries.get(&fd).ok_or(FdError::NotFound(fd))
    }

    /// Look up an open descriptor for mutation (read/write/seek move the cursor).
    #[inline]
    pub fn lookup_mut(&mut self, fd: Fd) -> Result<&mut T, FdError> {
        self.entries.get_mut(&fd).ok_or(FdError::NotFound(fd))
    }

    /// Release a descriptor and close its handle.
    ///
    /// A second close of the same descriptor reports `NotFound`.
    pub fn close(&mut self, fd: Fd) -> Result<(), FdError> {
        self.entries
            .remove(&fd)
            .map(drop)
            .ok_or(FdError::NotFound(fd))
    }

    /// Close every live descriptor, returning how many were released.
    pub fn close_all(&mut self) -> usize {
        let closed = self.entries.len();
        self.entries.clear();
        closed
    }

    /// Number of live descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no descriptor is open.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_descriptors_start_at_two_and_increase() {
        let mut table = FdTable::new(8);
        assert_eq!(table.open("a"), Ok(Fd::new(2)));
        assert_eq!(table.open("b"), Ok(Fd::new(3)));
        table.close(Fd::new(2)).unwrap();
        assert_eq!(table.open("c"), Ok(Fd::new(4)));
    }

    #[test]
    fn test_console_descriptors_never_in_table() {
        let mut table = FdTable::new(8);
        table.open(()).unwrap();
        assert_eq!(table.lookup(Fd::STDIN).err(), Some(FdError::NotFound(Fd::STDIN)));
        assert_eq!(table.lookup(Fd::STDOUT).err(), Some(FdError::NotFound(Fd::STDOUT)));
        assert_eq!(table.close(Fd::STDOUT), Err(FdError::NotFound(Fd::STDOUT)));
    }

    #[test]
    fn test_double_close_reports_not_found() {
        let handle = Rc::new(());
        let mut table = FdTable::new(8);
        let fd = table.open(Rc::clone(&handle)).unwrap();
        assert_eq!(Rc::strong_count(&handle), 2);

        assert_eq!(table.close(fd), Ok(()));
        assert_eq!(Rc::strong_count(&handle), 1);
        assert_eq!(table.close(fd), Err(FdError::NotFound(fd)));
        assert_eq!(Rc::strong_count(&handle), 1);
    }

    #[test]
    fn test_exhaustion_drops_handle() {
        let handle = Rc::new(());
        let mut table = FdTable::new(1);
        table.open(Rc::clone(&handle)).unwrap();
        assert_eq!(table.open(Rc::clone(&handle)), Err(FdError::Exhausted));
        assert_eq!(Rc::strong_count(&handle), 2);
    }

    #[test]
    fn test_close_all() {
        let handle = Rc::new(());
        let mut table = FdTable::new(8);
        for _ in 0..3 {
            table.open(Rc::clone(&handle)).unwrap();
        }
        assert_eq!(table.close_all(), 3);
        assert!(table.is_empty());
        assert_eq!(Rc::strong_count(&handle), 1);
    }

    #[test]
    fn test_lookup_mut() {
        let mut table = FdTable::new(8);
        let fd = table.open(1u32).unwrap();
        *table.lookup_mut(fd).unwrap() += 1;
        assert_eq!(table.lookup(fd), Ok(&2));
    }
}
