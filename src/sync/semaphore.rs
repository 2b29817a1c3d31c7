//! Counting Semaphore
//!
//! Blocks kernel threads through the scheduler's [`Parker`] instead of
//! spinning. The internal lock is only held to update the count and the
//! waiter queue, never across a park.

use alloc::collections::VecDeque;
use spin::Mutex;

/// Scheduler-assigned identity of a kernel thread.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ThreadId(pub u64);

/// Block/unblock primitive provided by the scheduler.
///
/// Contract: an `unpark` that arrives before the matching `park` makes that
/// `park` return immediately. `park` may also return spuriously.
pub trait Parker: Sync {
    /// The calling thread.
    fn current(&self) -> ThreadId;

    /// Block the calling thread until unparked.
    fn park(&self);

    /// Make `thread` runnable again.
    fn unpark(&self, thread: ThreadId);
}

struct State {
    value: usize,
    waiters: VecDeque<ThreadId>,
}

/// A counting semaphore.
pub struct Semaphore {
    state: Mutex<State>,
}

impl Semaphore {
    /// Create a semaphore with an initial count.
    pub const fn new(value: usize) -> Self {
        Self {
            state: Mutex::new(State {
                value,
                waiters: VecDeque::new(),
            }),
        }
    }

    /// Wait for the count to become positive, then decrement it.
    pub fn down(&self, parker: &dyn Parker) {
        let me = parker.current();
        loop {
            {
                let mut state = self.state.lock();
                if state.value > 0 {
                    state.value -= 1;
                    state.waiters.retain(|&t| t != me);
                    return;
                }
                if !state.waiters.contains(&me) {
                    state.waiters.push_back(me);
                }
            }
            parker.park();
        }
    }

    /// Increment the count and wake the longest waiter.
    pub fn up(&self, parker: &dyn Parker) {
        let waiter = {
            let mut state = self.state.lock();
            state.value += 1;
            state.waiters.pop_front()
        };
        if let Some(thread) = waiter {
            parker.unpark(thread);
        }
    }
}
