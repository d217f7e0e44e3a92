//! Per-Process File Descriptors
//!
//! Maps small integer handles to kernel-owned file objects.
//!
//! # Design
//! - Each process owns exactly one `FdTable`
//! - Descriptors 0 and 1 are reserved for the console and never allocated
//! - Descriptor values are handed out from a monotonic counter
//!
//! # Security Properties
//! - A file object is reachable through exactly one table entry
//! - Removing an entry closes its file exactly once
//! - Descriptors cannot be forged into entries that were never allocated

pub mod descriptor;
pub mod table;

pub use descriptor::{Fd, FdError};
pub use table::{FdTable, TableFull, MAX_OPEN_FILES};
