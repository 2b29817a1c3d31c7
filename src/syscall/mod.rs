//! System Call Interface
//!
//! Services the `int 0x30` trap for user programs.
//!
//! # Security Model
//! - Whitelist approach: only the numbers in [`Sysno`] are accepted
//! - Every stack slot and pointer argument is validated before use
//! - A bad address terminates the caller, never the kernel
//!
//! # Syscalls
//! - 0: halt()
//! - 1: exit(status)
//! - 2: exec(cmdline) -> pid
//! - 3: wait(pid) -> status
//! - 4: create(name, initial_size) -> bool
//! - 5: remove(name) -> bool
//! - 6: open(name) -> fd
//! - 7: filesize(fd) -> size
//! - 8: read(fd, buf, len) -> count
//! - 9: write(fd, buf, len) -> count
//! - 10: seek(fd, position)
//! - 11: tell(fd) -> position
//! - 12: close(fd)

pub mod abi;
pub mod decode;
pub mod frame;
pub mod handler;
pub mod validate;

mod file;
mod process;

pub use abi::Sysno;
pub use decode::{decode, DecodeError, Syscall};
pub use frame::TrapFrame;
pub use handler::Disposition;
pub use validate::{UserBuffer, UserBufferMut, UserFault, UserString};
