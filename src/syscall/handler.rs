//! System Call Handler
//!
//! Dispatches decoded system calls to the individual operations and writes
//! their results back into the trap frame.
//!
//! # Security Considerations
//! - Nothing here runs until `decode` has validated every argument
//! - A bad address terminates the caller with status -1 before any side effect
//! - Unknown syscall numbers terminate the caller with status -1

use alloc::sync::Arc;

use log::{trace, warn};

use crate::kernel::{Kernel, Platform};
use crate::mm::AddressSpace;
use crate::proc::Process;

use super::abi::EXIT_FAILURE;
use super::decode::{decode, DecodeError, Syscall};
use super::frame::TrapFrame;
use super::{file, process};

/// What the trap path does after a syscall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Return to user mode.
    Resume,
    /// The caller exited with this status; its thread must end.
    Terminated(i32),
    /// Halt was requested.
    PowerOff,
}

/// The explicit process context every operation runs in.
pub(crate) struct Context<'k, P: Platform> {
    pub kernel: &'k Kernel<P>,
    pub process: &'k Arc<Process>,
}

impl<P: Platform> Kernel<P> {
    /// Decode and execute one syscall for `process`.
    ///
    /// # Returns
    /// What the trap path must do next. The result slot of `frame` is
    /// written for every syscall that produces a value.
    pub fn dispatch<S>(
        &self,
        process: &Arc<Process>,
        frame: &mut TrapFrame,
        space: &S,
    ) -> Disposition
    where
        S: AddressSpace + ?Sized,
    {
        let call = match decode(frame, space) {
            Ok(call) => call,
            Err(err) => {
                warn!("pid {}: {}", process.pid(), err);
                if let DecodeError::UnknownSyscall(_) = err {
                    frame.set_result(EXIT_FAILURE);
                }
                self.exit(process, EXIT_FAILURE);
                return Disposition::Terminated(EXIT_FAILURE);
            }
        };
        trace!("pid {}: {:?}", process.pid(), call);

        let ctx = Context {
            kernel: self,
            process,
        };
        match call {
            Syscall::Halt => return process::sys_halt(&ctx),
            Syscall::Exit { status } => return process::sys_exit(&ctx, status),
            Syscall::Exec { cmdline } => frame.set_result(process::sys_exec(&ctx, &cmdline)),
            Syscall::Wait { pid } => frame.set_result(process::sys_wait(&ctx, pid)),
            Syscall::Create { name, initial_size } => {
                frame.set_result(file::sys_create(&ctx, &name, initial_size).into())
            }
            Syscall::Remove { name } => frame.set_result(file::sys_remove(&ctx, &name).into()),
            Syscall::Open { name } => frame.set_result(file::sys_open(&ctx, &name)),
            Syscall::Filesize { fd } => frame.set_result(file::sys_filesize(&ctx, fd)),
            Syscall::Read { fd, mut buf } => frame.set_result(file::sys_read(&ctx, fd, &mut buf)),
            Syscall::Write { fd, buf } => frame.set_result(file::sys_write(&ctx, fd, &buf)),
            Syscall::Seek { fd, position } => file::sys_seek(&ctx, fd, position),
            Syscall::Tell { fd } => frame.set_result(file::sys_tell(&ctx, fd)),
            Syscall::Close { fd } => file::sys_close(&ctx, fd),
        }
        Disposition::Resume
    }
}
