//! Syscall Decoding
//!
//! The only phase that touches raw user memory. It turns a trap frame into a
//! typed [`Syscall`] whose pointer arguments are already validated, so the
//! dispatch phase never sees an unchecked address.
//!
//! # Order of checks
//! 1. The slot holding the syscall number
//! 2. Each argument slot the number's arity calls for
//! 3. The memory each pointer argument designates

use core::fmt;

use crate::fd::Fd;
use crate::mm::{AddressSpace, VirtAddr};

use super::abi::{Sysno, MAX_ARGS};
use super::frame::TrapFrame;
use super::validate::{
    read_cstr, read_word, validate_user_read, validate_user_write, UserBuffer, UserBufferMut,
    UserFault, UserString,
};

/// A decoded system call with validated arguments.
#[derive(Debug)]
pub enum Syscall<'a> {
    Halt,
    Exit { status: i32 },
    Exec { cmdline: UserString },
    Wait { pid: i32 },
    Create { name: UserString, initial_size: u32 },
    Remove { name: UserString },
    Open { name: UserString },
    Filesize { fd: Fd },
    Read { fd: Fd, buf: UserBufferMut<'a> },
    Write { fd: Fd, buf: UserBuffer<'a> },
    Seek { fd: Fd, position: u32 },
    Tell { fd: Fd },
    Close { fd: Fd },
}

/// Why a trap frame could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A slot or pointer argument failed validation.
    Fault(UserFault),
    /// The number names no syscall.
    UnknownSyscall(u32),
}

impl From<UserFault> for DecodeError {
    fn from(fault: UserFault) -> Self {
        Self::Fault(fault)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fault(fault) => write!(f, "bad user address: {}", fault),
            Self::UnknownSyscall(nr) => write!(f, "unknown syscall number {}", nr),
        }
    }
}

fn ptr(word: u32) -> VirtAddr {
    VirtAddr::new(word as usize)
}

fn fd(word: u32) -> Fd {
    Fd::new(word as i32)
}

/// Decode the syscall described by `frame`.
pub fn decode<'a, S>(frame: &TrapFrame, space: &'a S) -> Result<Syscall<'a>, DecodeError>
where
    S: AddressSpace + ?Sized,
{
    let raw = read_word(space, frame.slot(0)?)?;
    let sysno = Sysno::from_raw(raw).ok_or(DecodeError::UnknownSyscall(raw))?;

    let mut args = [0u32; MAX_ARGS];
    for (index, arg) in args.iter_mut().enumerate().take(sysno.arity()) {
        *arg = read_word(space, frame.slot(index + 1)?)?;
    }
    let [a0, a1, a2] = args;

    let call = match sysno {
        Sysno::Halt => Syscall::Halt,
        Sysno::Exit => Syscall::Exit { status: a0 as i32 },
        Sysno::Exec => Syscall::Exec {
            cmdline: read_cstr(space, ptr(a0))?,
        },
        Sysno::Wait => Syscall::Wait { pid: a0 as i32 },
        Sysno::Create => Syscall::Create {
            name: read_cstr(space, ptr(a0))?,
            initial_size: a1,
        },
        Sysno::Remove => Syscall::Remove {
            name: read_cstr(space, ptr(a0))?,
        },
        Sysno::Open => Syscall::Open {
            name: read_cstr(space, ptr(a0))?,
        },
        Sysno::Filesize => Syscall::Filesize { fd: fd(a0) },
        Sysno::Read => Syscall::Read {
            fd: fd(a0),
            buf: validate_user_write(space, ptr(a1), a2 as usize)?,
        },
        Sysno::Write => Syscall::Write {
            fd: fd(a0),
            buf: validate_user_read(space, ptr(a1), a2 as usize)?,
        },
        Sysno::Seek => Syscall::Seek {
            fd: fd(a0),
            position: a1,
        },
        Sysno::Tell => Syscall::Tell { fd: fd(a0) },
        Sysno::Close => Syscall::Close { fd: fd(a0) },
    };
    Ok(call)
}
