//! Console devices for PantherOS user programs
//!
//! - `console`: the interface stdin/stdout system calls go through
//! - `uart`: the PL011 backend for that interface and for kernel logging

pub mod console;
pub mod uart;
