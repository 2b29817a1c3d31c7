//! Syscall ABI
//!
//! Fixed numbering and argument arity of every operation user code can
//! request. Numbers match the user library's `syscall-nr` table.

/// Largest number of arguments any syscall takes.
pub const MAX_ARGS: usize = 3;

/// Status a process is terminated with after a fault.
pub const EXIT_FAILURE: i32 = -1;

/// System call numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Sysno {
    Halt = 0,
    Exit = 1,
    Exec = 2,
    Wait = 3,
    Create = 4,
    Remove = 5,
    Open = 6,
    Filesize = 7,
    Read = 8,
    Write = 9,
    Seek = 10,
    Tell = 11,
    Close = 12,
}

impl Sysno {
    /// Map a raw number from the user stack.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Halt,
            1 => Self::Exit,
            2 => Self::Exec,
            3 => Self::Wait,
            4 => Self::Create,
            5 => Self::Remove,
            6 => Self::Open,
            7 => Self::Filesize,
            8 => Self::Read,
            9 => Self::Write,
            10 => Self::Seek,
            11 => Self::Tell,
            12 => Self::Close,
            _ => return None,
        })
    }

    /// Number of word-sized argument slots following the number.
    pub const fn arity(self) -> usize {
        match self {
            Self::Halt => 0,
            Self::Exit
            | Self::Exec
            | Self::Wait
            | Self::Remove
            | Self::Open
            | Self::Filesize
            | Self::Tell
            | Self::Close => 1,
            Self::Create | Self::Seek => 2,
            Self::Read | Self::Write => 3,
        }
    }
}
