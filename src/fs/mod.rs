//! Filesystem Interface
//!
//! The filesystem itself is an external collaborator. The syscall layer
//! needs name-level operations and a handful of operations on an open
//! handle; closing a handle is dropping it.

use alloc::boxed::Box;

/// An open file.
///
/// Dropping the handle closes the file.
pub trait File: Send {
    /// Length of the file in bytes.
    fn length(&self) -> u32;

    /// Read from the cursor into `buf`, returning bytes read.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Write `buf` at the cursor, returning bytes written.
    fn write(&mut self, buf: &[u8]) -> usize;

    /// Move the cursor. Positions past the end are allowed.
    fn seek(&mut self, position: u32);

    /// Current cursor position.
    fn tell(&self) -> u32;

    /// Refuse writes to the underlying file while this handle lives.
    fn deny_write(&mut self) {}

    /// Undo `deny_write`.
    fn allow_write(&mut self) {}
}

/// An owned open file handle.
pub type FileHandle = Box<dyn File>;

/// Name-level filesystem operations.
pub trait FileSystem: Sync {
    /// Create a file of `initial_size` zero bytes.
    fn create(&self, name: &str, initial_size: u32) -> bool;

    /// Remove a file by name.
    fn remove(&self, name: &str) -> bool;

    /// Open a file by name.
    fn open(&self, name: &str) -> Option<FileHandle>;
}
