//! System call error codes

use core::fmt;

/// Reasons a system call cannot proceed.
///
/// None of these reach the user as a return value: each one is fatal to
/// the calling process.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallError {
    /// Invalid system call number
    Enosys = -38,
    /// Bad address (invalid pointer)
    Efault = -14,
}

impl fmt::Display for SyscallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enosys => write!(f, "unknown system call"),
            Self::Efault => write!(f, "bad user address"),
        }
    }
}
