//! Process Control Block extensions
//!
//! The scheduler owns threads; this is the part of a process the syscall
//! layer needs: identity, open files, the lifecycle record shared with
//! the parent, and the records of its own children.
//!
//! # Teardown
//! `terminate` is the only way out. Explicit exit, validation failures and
//! user faults all call it; it runs its body once no matter how often it is
//! reached.

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::{self, Write};

use log::{debug, warn};

use super::host::{Pid, ProcessHost};
use super::lifecycle::{Lifecycle, STATUS_UNKNOWN};
use crate::drivers::console::{Console, ConsoleWriter};
use crate::fd::FdTable;
use crate::fs::OpenFile;

/// Status used when the kernel kills a process.
pub const KILLED_STATUS: i32 = -1;

/// Program name of a command line: its first whitespace-separated token.
pub fn program_name(cmdline: &str) -> &str {
    cmdline.split_whitespace().next().unwrap_or("")
}

/// A child started through `exec` and not yet waited for.
struct Child {
    pid: Pid,
    lifecycle: Arc<Lifecycle>,
}

/// Per-process state touched by system calls.
pub struct Process<F: OpenFile> {
    pid: Pid,
    name: String,
    files: FdTable<F>,
    lifecycle: Arc<Lifecycle>,
    children: Vec<Child>,
    torn_down: bool,
}

impl<F: OpenFile> Process<F> {
    /// Create a process nobody will wait for (the initial program).
    pub fn new(pid: Pid, name: &str) -> Self {
        Self::spawned(pid, name, Arc::new(Lifecycle::new()))
    }

    /// Create the process for a thread started by [`ProcessHost::spawn`],
    /// sharing `lifecycle` with its creator.
    pub fn spawned(pid: Pid, name: &str, lifecycle: Arc<Lifecycle>) -> Self {
        Self {
            pid,
            name: name.to_string(),
            files: FdTable::new(),
            lifecycle,
            children: Vec::new(),
            torn_down: false,
        }
    }

    /// Process identifier.
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Program name, as printed on exit.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open file descriptors.
    #[inline]
    pub fn files(&self) -> &FdTable<F> {
        &self.files
    }

    /// Open file descriptors, mutably.
    #[inline]
    pub fn files_mut(&mut self) -> &mut FdTable<F> {
        &mut self.files
    }

    /// The record shared with this process's creator.
    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    /// Exit status, once set.
    pub fn exit_status(&self) -> Option<i32> {
        self.lifecycle.exit_status()
    }

    /// Whether teardown has run.
    pub fn is_terminated(&self) -> bool {
        self.torn_down
    }

    /// Whether `pid` is a child that can still be waited for.
    pub fn has_child(&self, pid: Pid) -> bool {
        self.children.iter().any(|child| child.pid == pid)
    }

    /// Start `cmdline` as a child and block until its load result is known.
    ///
    /// Returns the child's id, or [`Pid::ERROR`] if it could not be created
    /// or its program failed to load.
    pub fn exec(&mut self, cmdline: &str, host: &dyn ProcessHost) -> Pid {
        if program_name(cmdline).is_empty() {
            return Pid::ERROR;
        }

        let lifecycle = Arc::new(Lifecycle::new());
        let Some(pid) = host.spawn(cmdline, Arc::clone(&lifecycle)) else {
            debug!("{}: exec {:?}: no thread", self.name, cmdline);
            return Pid::ERROR;
        };

        if !lifecycle.wait_load(host) {
            debug!("{}: exec {:?}: load failed", self.name, cmdline);
            return Pid::ERROR;
        }

        debug!("{}: exec {:?} -> pid {}", self.name, cmdline, pid);
        self.children.push(Child { pid, lifecycle });
        pid
    }

    /// Block until child `pid` exits and return its status.
    ///
    /// Returns -1 at once if `pid` is not a child of this process or has
    /// already been waited for.
    pub fn wait(&mut self, pid: Pid, host: &dyn ProcessHost) -> i32 {
        let Some(index) = self.children.iter().position(|child| child.pid == pid) else {
            return STATUS_UNKNOWN;
        };
        let child = self.children.swap_remove(index);
        child.lifecycle.wait_exit(host)
    }

    /// Tear the process down: record `status`, print the exit line, close
    /// every descriptor and release a waiting parent.
    ///
    /// Returns the status that was recorded. Only the first call has any
    /// effect.
    pub fn terminate(
        &mut self,
        status: i32,
        console: &dyn Console,
        host: &dyn ProcessHost,
    ) -> i32 {
        if self.torn_down {
            return self.exit_status().unwrap_or(status);
        }
        self.torn_down = true;

        let status = self.lifecycle.set_exit_status(status);
        let _ = writeln!(ConsoleWriter(console), "{}: exit({})", self.name, status);

        let closed = self.files.release_all();
        debug!("{}: closed {} files on exit", self.name, closed);

        // Children outlive us; their records are simply no longer observed.
        self.children.clear();

        if !self.lifecycle.load_reported() {
            self.lifecycle.report_load(false, host);
        }
        self.lifecycle.notify_exit(host);
        status
    }

    /// Terminate with the kill status after a fatal error.
    pub fn kill(
        &mut self,
        reason: &dyn fmt::Display,
        console: &dyn Console,
        host: &dyn ProcessHost,
    ) -> i32 {
        warn!("{} (pid {}): killed: {}", self.name, self.pid, reason);
        self.terminate(KILLED_STATUS, console, host)
    }
}
