//! Trap Frame
//!
//! The slice of saved user context the syscall layer needs: the user stack
//! pointer, which addresses the argument slots, and the result register.
//!
//! # Stack layout at `int 0x30`
//! ```text
//! esp + 0   syscall number
//! esp + 4   argument 0
//! esp + 8   argument 1
//! esp + 12  argument 2
//! ```

use crate::mm::VirtAddr;

use super::validate::{UserFault, WORD_SIZE};

/// Saved user context at syscall entry.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    /// Result register.
    pub eax: u32,
    /// User stack pointer at the time of the trap.
    pub esp: u32,
}

impl TrapFrame {
    /// Frame for a trap taken with the given user stack pointer.
    pub const fn new(esp: u32) -> Self {
        Self { eax: 0, esp }
    }

    /// Address of argument slot `index` (slot 0 holds the syscall number).
    ///
    /// This is only an address; the slot still has to be validated.
    pub fn slot(&self, index: usize) -> Result<VirtAddr, UserFault> {
        let base = VirtAddr::new(self.esp as usize);
        index
            .checked_mul(WORD_SIZE)
            .and_then(|offset| base.checked_add(offset))
            .ok_or(UserFault::Overflow(base))
    }

    /// Store a syscall result.
    #[inline]
    pub fn set_result(&mut self, value: i32) {
        self.eax = value as u32;
    }

    /// The result register, as the signed value user code sees.
    #[inline]
    pub fn result(&self) -> i32 {
        self.eax as i32
    }
}
