//! System Call Interface
//!
//! The boundary user programs cross to request kernel services.
//!
//! # Security Model
//! - Whitelist approach: only the numbers in `call::numbers` are accepted
//! - All parameters are validated before use
//! - Invalid inputs terminate the caller, never the kernel
//!
//! # Per-call flow
//! `decode` (number + validated arguments) → `dispatch` (one match arm)
//! → result written to the frame, or the process torn down.
//!
//! # Syscalls
//! halt, exit, exec, wait, create, remove, open, filesize, read, write,
//! seek, tell, close

pub mod call;
pub mod error;
pub mod handler;
pub mod validate;

pub use call::{numbers, Syscall, TrapFrame};
pub use error::SyscallError;
pub use handler::{Disposition, Dispatcher};
pub use validate::{DirectMapped, PageFlags, UserMemory, UserRange};
