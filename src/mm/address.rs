//! User Virtual Address Types
//!
//! Type-safe wrapper for addresses supplied by user programs, so a raw
//! integer from a trap frame cannot be mistaken for a kernel pointer.
//!
//! # Layout
//! ```text
//! 0x0000_0000 ┌──────────────────────┐
//!             │   user code / data   │
//!             │          ...         │
//!             │      user stack      │
//! PHYS_BASE   ├──────────────────────┤  0xC000_0000
//!             │   kernel (mapped in  │
//!             │   every process)     │
//! 0xFFFF_FFFF └──────────────────────┘
//! ```

use core::fmt;

/// Page size (4 KiB)
pub const PAGE_SIZE: usize = 4096;
/// Page size mask
pub const PAGE_MASK: usize = PAGE_SIZE - 1;
/// Bits to shift for page number
pub const PAGE_SHIFT: usize = 12;

/// The user/kernel split: everything at or above belongs to the kernel.
pub const PHYS_BASE: usize = 0xC000_0000;

/// A virtual address in a user program's address space.
///
/// Construction does not validate anything; validity is decided by
/// `syscall::validate` against the process's page table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct UserAddr(usize);

impl UserAddr {
    /// Create a new user address.
    #[inline]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Check for the null pointer.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Check if this address lies below the user/kernel split.
    #[inline]
    pub const fn is_user(self) -> bool {
        self.0 < PHYS_BASE
    }

    /// Align the address down to the start of its page.
    #[inline]
    pub const fn page_base(self) -> Self {
        Self(self.0 & !PAGE_MASK)
    }

    /// Get the page number.
    #[inline]
    pub const fn page_number(self) -> usize {
        self.0 >> PAGE_SHIFT
    }

    /// Get the offset within the page (lowest 12 bits).
    #[inline]
    pub const fn page_offset(self) -> usize {
        self.0 & PAGE_MASK
    }

    /// Add an offset, returning None on overflow.
    #[inline]
    pub const fn checked_add(self, offset: usize) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }
}

impl fmt::Debug for UserAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserAddr({:#010x})", self.0)
    }
}

impl fmt::Display for UserAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
