//! File syscalls: create, remove, open, filesize, read, write, seek, tell, close.
//!
//! Descriptors 0 and 1 are the console and are handled before the
//! descriptor table is consulted; every other descriptor must be open in
//! the calling process's own table.

use log::debug;

use crate::fd::Fd;
use crate::kernel::Platform;

use super::handler::Context;
use super::validate::{UserBuffer, UserBufferMut, UserString};

/// Clamp a size, position or byte count into the result register, keeping
/// it clear of the negative failure sentinel.
fn count<T: TryInto<i32>>(value: T) -> i32 {
    value.try_into().unwrap_or(i32::MAX)
}

/// Usable file name, if the user string is valid UTF-8 and non-empty.
fn file_name(name: &UserString) -> Option<&str> {
    name.as_str().filter(|name| !name.is_empty())
}

pub(super) fn sys_create<P: Platform>(
    ctx: &Context<'_, P>,
    name: &UserString,
    initial_size: u32,
) -> bool {
    match file_name(name) {
        Some(name) => ctx.kernel.platform().filesystem().create(name, initial_size),
        None => false,
    }
}

pub(super) fn sys_remove<P: Platform>(ctx: &Context<'_, P>, name: &UserString) -> bool {
    match file_name(name) {
        Some(name) => ctx.kernel.platform().filesystem().remove(name),
        None => false,
    }
}

/// Open system call
///
/// # Returns
/// A new descriptor (always >= 2), or -1 if the file does not exist or the
/// caller's descriptor table is full.
pub(super) fn sys_open<P: Platform>(ctx: &Context<'_, P>, name: &UserString) -> i32 {
    let Some(name) = file_name(name) else {
        return -1;
    };
    let Some(file) = ctx.kernel.platform().filesystem().open(name) else {
        debug!("open {:?}: not found", name);
        return -1;
    };
    match ctx.process.files().open(file) {
        Ok(fd) => fd.as_i32(),
        Err(err) => {
            debug!("open {:?}: {}", name, err);
            -1
        }
    }
}

pub(super) fn sys_filesize<P: Platform>(ctx: &Context<'_, P>, fd: Fd) -> i32 {
    match ctx.process.files().lookup(fd) {
        Ok(file) => count(file.length()),
        Err(err) => {
            debug!("filesize: {}", err);
            -1
        }
    }
}

/// Read system call
///
/// Console reads have teletype semantics: one byte per call.
///
/// # Returns
/// Bytes read, or -1 for an unknown descriptor or descriptor 1.
pub(super) fn sys_read<P: Platform>(
    ctx: &Context<'_, P>,
    fd: Fd,
    buf: &mut UserBufferMut<'_>,
) -> i32 {
    if fd == Fd::STDIN {
        if buf.is_empty() {
            return 0;
        }
        let byte = ctx.kernel.platform().console().read_byte();
        return i32::from(buf.put_first(byte));
    }
    if fd == Fd::STDOUT {
        debug!("read: descriptor {} is write-only", fd);
        return -1;
    }

    // Only the owning process's thread reaches its table, so holding the
    // lock across the file call never contends.
    let mut files = ctx.process.files();
    let file = match files.lookup_mut(fd) {
        Ok(file) => file,
        Err(err) => {
            debug!("read: {}", err);
            return -1;
        }
    };
    let mut total = 0;
    buf.for_each_segment_mut(|bytes| {
        let n = file.read(bytes);
        total += n;
        n == bytes.len()
    });
    count(total)
}

/// Write system call
///
/// # Returns
/// Bytes written, or -1 for an unknown descriptor or descriptor 0.
/// Console writes always take the whole buffer.
pub(super) fn sys_write<P: Platform>(ctx: &Context<'_, P>, fd: Fd, buf: &UserBuffer<'_>) -> i32 {
    if fd == Fd::STDOUT {
        let console = ctx.kernel.platform().console();
        buf.for_each_segment(|bytes| {
            console.write_bytes(bytes);
            true
        });
        return count(buf.len());
    }
    if fd == Fd::STDIN {
        debug!("write: descriptor {} is read-only", fd);
        return -1;
    }

    // Only the owning process's thread reaches its table, so holding the
    // lock across the file call never contends.
    let mut files = ctx.process.files();
    let file = match files.lookup_mut(fd) {
        Ok(file) => file,
        Err(err) => {
            debug!("write: {}", err);
            return -1;
        }
    };
    let mut total = 0;
    buf.for_each_segment(|bytes| {
        let n = file.write(bytes);
        total += n;
        n == bytes.len()
    });
    count(total)
}

/// Seek system call. Unknown descriptors are ignored.
pub(super) fn sys_seek<P: Platform>(ctx: &Context<'_, P>, fd: Fd, position: u32) {
    match ctx.process.files().lookup_mut(fd) {
        Ok(file) => file.seek(position),
        Err(err) => debug!("seek: {}", err),
    }
}

pub(super) fn sys_tell<P: Platform>(ctx: &Context<'_, P>, fd: Fd) -> i32 {
    match ctx.process.files().lookup(fd) {
        Ok(file) => count(file.tell()),
        Err(err) => {
            debug!("tell: {}", err);
            -1
        }
    }
}

/// Close system call. Closing an unknown or already-closed descriptor is a
/// reported no-op.
pub(super) fn sys_close<P: Platform>(ctx: &Context<'_, P>, fd: Fd) {
    if let Err(err) = ctx.process.files().close(fd) {
        debug!("close: {}", err);
    }
}
