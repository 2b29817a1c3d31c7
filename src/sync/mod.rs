//! Blocking synchronization
//!
//! Spinlocks come from `spin`; anything that may wait for another thread
//! goes through the scheduler's [`Parker`].

pub mod semaphore;

pub use semaphore::{Parker, Semaphore, ThreadId};
