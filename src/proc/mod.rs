//! Processes and their lifecycle
//!
//! # Design
//! - A [`Process`] owns its descriptor table and program image handle
//! - Teardown is an explicit, run-once step of exit, not a side effect of
//!   thread destruction
//! - Parent/child exit hand-off goes through per-child slots in the
//!   [`WaitRegistry`]

pub mod process;
pub mod table;
pub mod wait;

pub use process::{Pid, Process};
pub use table::ProcessTable;
pub use wait::{WaitError, WaitRegistry};
