//! Counting semaphore over the scheduler's block/unblock
//!
//! Counts are kept, so an `up` that happens before the matching `down`
//! is not lost.

use alloc::collections::VecDeque;
use spin::Mutex;

use super::host::{Pid, ProcessHost};

struct State {
    value: usize,
    waiters: VecDeque<Pid>,
}

/// A counting semaphore whose waiters are parked through a [`ProcessHost`].
pub struct Semaphore {
    state: Mutex<State>,
}

impl Semaphore {
    /// Create a semaphore with `value` initial permits.
    pub const fn new(value: usize) -> Self {
        Self {
            state: Mutex::new(State {
                value,
                waiters: VecDeque::new(),
            }),
        }
    }

    /// Take a permit, blocking the running thread until one is available.
    pub fn down(&self, host: &dyn ProcessHost) {
        let me = host.current();
        loop {
            {
                let mut state = self.state.lock();
                if state.value > 0 {
                    state.value -= 1;
                    state.waiters.retain(|&pid| pid != me);
                    return;
                }
                if !state.waiters.contains(&me) {
                    state.waiters.push_back(me);
                }
            }
            host.block_current();
        }
    }

    /// Release a permit and wake the longest waiter, if any.
    pub fn up(&self, host: &dyn ProcessHost) {
        let woken = {
            let mut state = self.state.lock();
            state.value += 1;
            state.waiters.pop_front()
        };
        if let Some(pid) = woken {
            host.unblock(pid);
        }
    }

    /// Current permit count.
    pub fn value(&self) -> usize {
        self.state.lock().value
    }
}
