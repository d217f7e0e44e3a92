//! PantherOS - User Program Boundary
//!
//! The layer through which unprivileged user processes request kernel
//! services: process lifecycle control, program execution and file I/O.
//!
//! # Components
//! - Argument & pointer validation (`syscall::validate`)
//! - Per-process file descriptor tables (`fd`)
//! - Process exit, exec and wait synchronization (`process`)
//! - The syscall dispatcher (`syscall`)
//!
//! # Security Features
//! - Every user pointer is validated before the kernel touches it
//! - Descriptor entries own their file objects; closing is exactly-once
//! - Every termination path funnels through a single teardown
//!
//! # Collaborators
//! The filesystem, scheduler, page tables and console are external. The
//! crate consumes them through the traits in `fs`, `process::host`,
//! `syscall::validate` and `drivers::console`, which keeps the whole
//! boundary testable on the host.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod drivers;
pub mod fd;
pub mod fs;
pub mod mm;
pub mod process;
pub mod syscall;
pub mod trap;

#[cfg(test)]
pub(crate) mod testing;

pub use drivers::console::Console;
pub use fd::{Fd, FdTable};
pub use fs::{FileSystem, OpenFile};
pub use process::{Lifecycle, Pid, Process, ProcessHost};
pub use syscall::{Disposition, Dispatcher, TrapFrame, UserMemory};
