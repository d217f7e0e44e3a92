//! File Descriptor Table
//!
//! A per-process map from descriptor values to owned file objects.
//!
//! # Design
//! - Entries live in a `BTreeMap` keyed by descriptor
//! - Values come from a counter seeded above the console handles, so a
//!   closed descriptor is never handed out again by the same table
//! - Ownership of the file moves in at `allocate` and out (into `close`)
//!   at `release`/`release_all`

use alloc::collections::BTreeMap;
use core::fmt;
use core::mem;

use log::debug;

use super::descriptor::{Fd, FdError};
use crate::fs::OpenFile;

/// Maximum number of simultaneously open files per process.
pub const MAX_OPEN_FILES: usize = 128;

/// Returned by [`FdTable::allocate`] when no descriptor is available.
///
/// Carries the file back so the caller can close it instead of leaking it.
pub struct TableFull<F>(pub F);

impl<F> fmt::Debug for TableFull<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableFull")
    }
}

impl<F> fmt::Display for TableFull<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no descriptor available")
    }
}

/// File descriptor table for one process.
pub struct FdTable<F: OpenFile> {
    /// Next descriptor value to hand out.
    next_fd: i32,
    /// Open files keyed by descriptor.
    entries: BTreeMap<Fd, F>,
}

impl<F: OpenFile> FdTable<F> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            next_fd: Fd::FIRST_FILE.as_i32(),
            entries: BTreeMap::new(),
        }
    }

    /// Install an open file and return its new descriptor.
    ///
    /// Fails only when the table is full or the counter is exhausted; the
    /// file is handed back inside the error.
    pub fn allocate(&mut self, file: F) -> Result<Fd, TableFull<F>> {
        if self.entries.len() >= MAX_OPEN_FILES || self.next_fd == i32::MAX {
            return Err(TableFull(file));
        }

        let fd = Fd::new(self.next_fd);
        self.next_fd += 1;
        self.entries.insert(fd, file);
        debug!("allocated {} ({} open)", fd, self.entries.len());
        Ok(fd)
    }

    /// Look up the file behind a descriptor.
    pub fn lookup(&self, fd: Fd) -> Result<&F, FdError> {
        Self::check(fd)?;
        self.entries.get(&fd).ok_or(FdError::NotFound)
    }

    /// Look up the file behind a descriptor for reading, writing or seeking.
    pub fn lookup_mut(&mut self, fd: Fd) -> Result<&mut F, FdError> {
        Self::check(fd)?;
        self.entries.get_mut(&fd).ok_or(FdError::NotFound)
    }

    /// Remove a descriptor and close its file.
    pub fn release(&mut self, fd: Fd) -> Result<(), FdError> {
        Self::check(fd)?;
        let file = self.entries.remove(&fd).ok_or(FdError::NotFound)?;
        file.close();
        debug!("released {}", fd);
        Ok(())
    }

    /// Close every remaining file. Returns how many were closed.
    ///
    /// Entries already released individually are gone and are not touched
    /// again, so this is safe to call after any sequence of `release`.
    pub fn release_all(&mut self) -> usize {
        let entries = mem::take(&mut self.entries);
        let count = entries.len();
        for (_, file) in entries {
            file.close();
        }
        if count > 0 {
            debug!("released {} remaining descriptors", count);
        }
        count
    }

    /// Number of open descriptors.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no descriptors are open.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(fd: Fd) -> Result<(), FdError> {
        if fd.is_console() {
            Err(FdError::Reserved)
        } else {
            Ok(())
        }
    }
}

impl<F: OpenFile> Default for FdTable<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: OpenFile> Drop for FdTable<F> {
    fn drop(&mut self) {
        self.release_all();
    }
}
