//! Scheduler / process collaborator interface

use alloc::sync::Arc;
use core::fmt;

use super::lifecycle::Lifecycle;

/// A process identifier. Shares its domain with thread identifiers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Pid(i32);

impl Pid {
    /// Returned by exec when no process could be started. Never a valid id.
    pub const ERROR: Self = Self(-1);

    /// Wrap a raw identifier.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Services the scheduler and program loader provide to the syscall layer.
pub trait ProcessHost {
    /// Start a new thread that loads and runs the program named by the
    /// first token of `cmdline`.
    ///
    /// The new thread must call [`Lifecycle::report_load`] once it knows
    /// whether the load succeeded, and its process must be built around
    /// `lifecycle` so that its exit is visible to the creator. Returns the
    /// new id, or None if no thread could be created.
    fn spawn(&self, cmdline: &str, lifecycle: Arc<Lifecycle>) -> Option<Pid>;

    /// Identity of the running thread.
    fn current(&self) -> Pid;

    /// Suspend the running thread until `unblock` names it.
    ///
    /// An `unblock` that arrives before the matching `block_current` must
    /// make it return immediately.
    fn block_current(&self);

    /// Make a thread suspended in `block_current` runnable again.
    fn unblock(&self, pid: Pid);
}
