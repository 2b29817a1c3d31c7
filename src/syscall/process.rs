//! Process control syscalls: halt, exit, exec, wait.

use log::{debug, info};

use crate::kernel::Platform;
use crate::proc::Pid;

use super::handler::{Context, Disposition};
use super::validate::UserString;

/// Halt system call
///
/// Powers the machine off. The trap path never returns to user mode.
pub(super) fn sys_halt<P: Platform>(ctx: &Context<'_, P>) -> Disposition {
    info!("halt requested by pid {}", ctx.process.pid());
    Disposition::PowerOff
}

/// Exit system call
///
/// Terminates the calling process with `status`.
///
/// # Security
/// No validation needed - any status code is acceptable
pub(super) fn sys_exit<P: Platform>(ctx: &Context<'_, P>, status: i32) -> Disposition {
    ctx.kernel.exit(ctx.process, status);
    Disposition::Terminated(status)
}

/// Exec system call
///
/// Starts `cmdline` as a child of the caller.
///
/// # Returns
/// The child's pid, or -1 if the program does not exist or fails to load.
pub(super) fn sys_exec<P: Platform>(ctx: &Context<'_, P>, cmdline: &UserString) -> i32 {
    let Some(cmdline) = cmdline.as_str() else {
        debug!("exec: command line is not UTF-8");
        return -1;
    };
    match ctx.kernel.spawn(Some(ctx.process), cmdline) {
        Ok(child) => child.pid().as_user(),
        Err(err) => {
            debug!("exec {:?}: {}", cmdline, err);
            -1
        }
    }
}

/// Wait system call
///
/// Blocks until child `pid` exits and returns its exit status.
///
/// # Returns
/// -1 without blocking if `pid` is not an unreaped child of the caller.
pub(super) fn sys_wait<P: Platform>(ctx: &Context<'_, P>, pid: i32) -> i32 {
    let Some(child) = Pid::from_user(pid) else {
        debug!("wait: invalid pid {}", pid);
        return -1;
    };
    match ctx.kernel.wait(ctx.process, child) {
        Ok(status) => status,
        Err(err) => {
            debug!("wait: {}", err);
            -1
        }
    }
}
