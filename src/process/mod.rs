//! Process lifecycle for user programs
//!
//! # Design
//! - `Process` holds what system calls touch: name, files, children
//! - `Lifecycle` is the record a child shares with its creator
//! - `Semaphore` provides the two blocking points: exec waiting for the
//!   load result and wait waiting for exit
//!
//! # Guarantees
//! - A child's status is stored before its parent is woken
//! - A parent can wait for each child once; other ids fail immediately
//! - Teardown runs exactly once per process

pub mod host;
pub mod lifecycle;
pub mod pcb;
pub mod sync;

pub use host::{Pid, ProcessHost};
pub use lifecycle::Lifecycle;
pub use pcb::{program_name, Process, KILLED_STATUS};
pub use sync::Semaphore;
