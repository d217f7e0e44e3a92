//! Descriptor values and errors

use core::fmt;

/// A file descriptor value as seen by user programs.
///
/// This is a newtype to prevent using arbitrary integers as table keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Fd(i32);

impl Fd {
    /// Standard input: reads come from the console keyboard.
    pub const STDIN: Self = Self(0);

    /// Standard output: writes go to the console.
    pub const STDOUT: Self = Self(1);

    /// First value handed out for real files.
    pub const FIRST_FILE: Self = Self(2);

    /// Wrap a raw descriptor value.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Check if this is one of the two console handles.
    #[inline]
    pub const fn is_console(self) -> bool {
        self.0 == Self::STDIN.0 || self.0 == Self::STDOUT.0
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fd {}", self.0)
    }
}

/// Error type for descriptor table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdError {
    /// The descriptor is one of the reserved console handles.
    Reserved,
    /// The descriptor was never allocated or has been closed.
    NotFound,
}

impl fmt::Display for FdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved => write!(f, "reserved console descriptor"),
            Self::NotFound => write!(f, "descriptor not open"),
        }
    }
}
