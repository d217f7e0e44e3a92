//! System Call Input Validation
//!
//! Every address a user program hands the kernel is checked here before
//! it is dereferenced.
//!
//! # Security Principles
//! - Validate ALL inputs before use
//! - Fail-secure: deny by default
//! - Prevent common vulnerabilities:
//!   - Buffer overflows (the whole range is checked, not just its start)
//!   - Kernel memory disclosure (nothing at or above `PHYS_BASE`)
//!   - Null pointer dereference (explicit checks)
//!   - Writes to read-only user pages (`WRITABLE` required for outputs)

use alloc::string::String;
use alloc::vec::Vec;

use bitflags::bitflags;

use super::error::SyscallError;
use crate::mm::address::{UserAddr, PAGE_SIZE};

/// Size of one argument slot on the user stack.
pub const WORD_SIZE: usize = 4;

/// Bytes of a user string the kernel will scan for its terminator. The
/// NUL must fall inside this window, so the longest name is one byte less.
pub const MAX_USER_STR: usize = PAGE_SIZE;

bitflags! {
    /// Permissions of a mapped user page.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFlags: u8 {
        /// Accessible from user mode.
        const USER = 1 << 0;
        /// Writable.
        const WRITABLE = 1 << 1;
    }
}

/// A process's user address space as seen from the kernel.
///
/// `read` and `write` are only called on ranges that passed validation.
pub trait UserMemory {
    /// Permissions of the page containing `page`, or None if unmapped.
    fn page_flags(&self, page: UserAddr) -> Option<PageFlags>;

    /// Copy `dst.len()` bytes starting at `addr` into `dst`.
    fn read(&self, addr: UserAddr, dst: &mut [u8]);

    /// Copy `src` to user memory starting at `addr`.
    fn write(&mut self, addr: UserAddr, src: &[u8]);
}

/// User memory reached through the current page table.
///
/// The kernel runs with the process's page directory active, so a
/// validated user address can be dereferenced directly.
pub struct DirectMapped<L> {
    lookup: L,
}

impl<L: Fn(UserAddr) -> Option<PageFlags>> DirectMapped<L> {
    /// Wrap a page-table lookup.
    ///
    /// # Safety
    /// Whenever `lookup` reports a page as mapped, that page must be
    /// accessible at its user address from the running kernel context.
    pub const unsafe fn new(lookup: L) -> Self {
        Self { lookup }
    }
}

impl<L: Fn(UserAddr) -> Option<PageFlags>> UserMemory for DirectMapped<L> {
    fn page_flags(&self, page: UserAddr) -> Option<PageFlags> {
        (self.lookup)(page)
    }

    fn read(&self, addr: UserAddr, dst: &mut [u8]) {
        if dst.is_empty() {
            return;
        }
        // SAFETY:
        // - The range was validated page by page against `lookup`
        // - The constructor's contract makes those pages accessible here
        // - `dst` is a kernel buffer and cannot overlap user memory
        unsafe {
            core::ptr::copy_nonoverlapping(
                addr.as_usize() as *const u8,
                dst.as_mut_ptr(),
                dst.len(),
            );
        }
    }

    fn write(&mut self, addr: UserAddr, src: &[u8]) {
        if src.is_empty() {
            return;
        }
        // SAFETY: as for `read`, with WRITABLE checked during validation.
        unsafe {
            core::ptr::copy_nonoverlapping(src.as_ptr(), addr.as_usize() as *mut u8, src.len());
        }
    }
}

/// A validated range of user memory.
///
/// This type guarantees that:
/// - The range lies entirely below the user/kernel split
/// - Every page it touches is mapped with the permissions it was checked for
/// - The length doesn't overflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRange {
    base: UserAddr,
    len: usize,
}

impl UserRange {
    /// Start of the range.
    #[inline]
    pub fn base(&self) -> UserAddr {
        self.base
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check for a zero-length range.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The first `max` bytes of the range, or all of it if shorter.
    pub fn truncated(self, max: usize) -> UserRange {
        UserRange {
            base: self.base,
            len: self.len.min(max),
        }
    }

    /// Split into consecutive sub-ranges of at most `size` bytes.
    pub fn chunks(self, size: usize) -> impl Iterator<Item = UserRange> {
        let size = size.max(1);
        (0..self.len).step_by(size).map(move |offset| UserRange {
            base: UserAddr::new(self.base.as_usize() + offset),
            len: size.min(self.len - offset),
        })
    }

    /// Copy the start of the range into `dst` (at most `len` bytes).
    pub fn copy_in(&self, mem: &dyn UserMemory, dst: &mut [u8]) {
        let n = dst.len().min(self.len);
        mem.read(self.base, &mut dst[..n]);
    }

    /// Copy `src` to the start of the range (at most `len` bytes).
    pub fn copy_out(&self, mem: &mut dyn UserMemory, src: &[u8]) {
        let n = src.len().min(self.len);
        mem.write(self.base, &src[..n]);
    }
}

fn check_page(
    mem: &dyn UserMemory,
    addr: UserAddr,
    required: PageFlags,
) -> Result<(), SyscallError> {
    match mem.page_flags(addr.page_base()) {
        Some(flags) if flags.contains(PageFlags::USER | required) => Ok(()),
        _ => Err(SyscallError::Efault),
    }
}

/// Validate `len` bytes of user memory starting at `ptr`.
///
/// # Security Checks
/// 1. Zero-length ranges are valid without further checks
/// 2. Pointer is not null
/// 3. Last byte doesn't overflow and lies below `PHYS_BASE`
/// 4. Every page from first to last byte is mapped with `USER | required`
pub fn validate_range(
    mem: &dyn UserMemory,
    ptr: usize,
    len: usize,
    required: PageFlags,
) -> Result<UserRange, SyscallError> {
    let base = UserAddr::new(ptr);
    if len == 0 {
        return Ok(UserRange { base, len: 0 });
    }

    if base.is_null() {
        return Err(SyscallError::Efault);
    }

    let last = base.checked_add(len - 1).ok_or(SyscallError::Efault)?;
    if !base.is_user() || !last.is_user() {
        return Err(SyscallError::Efault);
    }

    for page in base.page_number()..=last.page_number() {
        check_page(mem, UserAddr::new(page * PAGE_SIZE), required)?;
    }

    Ok(UserRange { base, len })
}

/// Read one argument word (little-endian) at `addr`.
pub fn read_word(mem: &dyn UserMemory, addr: usize) -> Result<u32, SyscallError> {
    let range = validate_range(mem, addr, WORD_SIZE, PageFlags::empty())?;
    let mut bytes = [0u8; WORD_SIZE];
    range.copy_in(mem, &mut bytes);
    Ok(u32::from_le_bytes(bytes))
}

/// Copy a NUL-terminated user string into the kernel.
///
/// Each page is checked as the walk reaches it, so a string may end right
/// before an unmapped page. A string whose NUL is not among its first
/// `MAX_USER_STR` bytes is invalid.
/// Bytes that are not UTF-8 are replaced, which makes such names simply
/// not match any file.
pub fn read_cstr(mem: &dyn UserMemory, ptr: usize) -> Result<String, SyscallError> {
    let mut cursor = UserAddr::new(ptr);
    if cursor.is_null() {
        return Err(SyscallError::Efault);
    }

    let mut bytes = Vec::new();
    let mut checked_page = None;
    for _ in 0..MAX_USER_STR {
        if !cursor.is_user() {
            return Err(SyscallError::Efault);
        }
        if checked_page != Some(cursor.page_number()) {
            check_page(mem, cursor, PageFlags::empty())?;
            checked_page = Some(cursor.page_number());
        }

        let mut byte = [0u8; 1];
        mem.read(cursor, &mut byte);
        if byte[0] == 0 {
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }
        bytes.push(byte[0]);
        cursor = cursor.checked_add(1).ok_or(SyscallError::Efault)?;
    }

    Err(SyscallError::Efault)
}
