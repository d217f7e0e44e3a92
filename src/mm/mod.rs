//! Memory layout for PantherOS user programs
//!
//! Provides:
//! - The user/kernel split and page geometry
//! - Typed user virtual addresses
//!
//! # Security Principles
//! - User addresses are a distinct type from raw integers
//! - Arithmetic on user addresses is overflow-checked

pub mod address;

pub use address::{UserAddr, PAGE_SIZE, PHYS_BASE};
