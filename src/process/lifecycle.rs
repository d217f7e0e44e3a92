//! Parent/child handoff for program load and exit
//!
//! A `Lifecycle` is shared between a process and its creator. The child
//! publishes two facts through it, each at most once: whether its program
//! loaded, and its exit status. Both are stored before the matching
//! semaphore is raised, so a reader that arrives late still sees them.

use spin::Once;

use super::host::ProcessHost;
use super::sync::Semaphore;

/// Status reported to a waiting parent when a child left no status.
pub const STATUS_UNKNOWN: i32 = -1;

/// Load and exit state of one process, shared with its parent.
pub struct Lifecycle {
    load: Once<bool>,
    load_done: Semaphore,
    status: Once<i32>,
    exit_done: Semaphore,
}

impl Lifecycle {
    /// Create the record for a process that has not loaded yet.
    pub const fn new() -> Self {
        Self {
            load: Once::new(),
            load_done: Semaphore::new(0),
            status: Once::new(),
            exit_done: Semaphore::new(0),
        }
    }

    /// Publish the load result and release the creator.
    ///
    /// Only the first report counts; later ones are ignored.
    pub fn report_load(&self, loaded: bool, host: &dyn ProcessHost) {
        if self.load.is_completed() {
            return;
        }
        self.load.call_once(|| loaded);
        self.load_done.up(host);
    }

    /// Whether a load result has been published.
    pub fn load_reported(&self) -> bool {
        self.load.is_completed()
    }

    /// Block until the load result is published and return it.
    pub fn wait_load(&self, host: &dyn ProcessHost) -> bool {
        self.load_done.down(host);
        self.load.get().copied().unwrap_or(false)
    }

    /// Store the exit status. The first writer wins; returns the status
    /// actually recorded.
    pub fn set_exit_status(&self, status: i32) -> i32 {
        *self.status.call_once(|| status)
    }

    /// Release a parent blocked in (or about to enter) `wait_exit`.
    pub fn notify_exit(&self, host: &dyn ProcessHost) {
        self.exit_done.up(host);
    }

    /// The exit status, if the process has exited.
    pub fn exit_status(&self) -> Option<i32> {
        self.status.get().copied()
    }

    /// Block until the process exits and return its status.
    pub fn wait_exit(&self, host: &dyn ProcessHost) -> i32 {
        self.exit_done.down(host);
        self.exit_status().unwrap_or(STATUS_UNKNOWN)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Pid;
    use crate::testing::ThreadHost;

    #[test]
    fn test_first_status_wins() {
        let life = Lifecycle::new();
        assert_eq!(life.set_exit_status(3), 3);
        assert_eq!(life.set_exit_status(-1), 3);
        assert_eq!(life.exit_status(), Some(3));
    }

    #[test]
    fn test_exit_before_wait_not_lost() {
        let host = ThreadHost::new();
        host.adopt_current(Pid::new(1));
        let life = Lifecycle::new();
        life.set_exit_status(42);
        life.notify_exit(&host);
        assert_eq!(life.wait_exit(&host), 42);
    }

    #[test]
    fn test_only_first_load_report_counts() {
        let host = ThreadHost::new();
        host.adopt_current(Pid::new(1));
        let life = Lifecycle::new();
        assert!(!life.load_reported());
        life.report_load(true, &host);
        life.report_load(false, &host);
        assert!(life.load_reported());
        assert!(life.wait_load(&host));
    }
}
