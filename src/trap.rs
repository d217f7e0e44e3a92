//! User Trap Handling
//!
//! Entry point for every synchronous trap raised while a user program
//! runs. System calls go to the dispatcher; any other fault kills the
//! process through the same teardown as `exit`.
//!
//! # Exception Classes (ARM64 ESR_EL1)
//! - SVC from AArch64: system call
//! - Instruction / data abort from a lower EL: user page fault
//! - Anything else from user mode: fatal to the process
//!
//! # Security Considerations
//! - A user fault never takes the kernel down
//! - Faults and rejected system calls print the same exit line as a
//!   normal exit, with status -1

use core::fmt;

use crate::fs::FileSystem;
use crate::mm::UserAddr;
use crate::process::Process;
use crate::syscall::{Disposition, Dispatcher, TrapFrame, UserMemory};

/// Exception class extracted from ESR_EL1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExceptionClass {
    Unknown = 0x00,
    SvcAarch64 = 0x15,
    InstructionAbortLowerEl = 0x20,
    DataAbortLowerEl = 0x24,
    Other = 0xFF,
}

impl From<u64> for ExceptionClass {
    fn from(esr: u64) -> Self {
        let ec = ((esr >> 26) & 0x3F) as u8;
        match ec {
            0x00 => ExceptionClass::Unknown,
            0x15 => ExceptionClass::SvcAarch64,
            0x20 => ExceptionClass::InstructionAbortLowerEl,
            0x24 => ExceptionClass::DataAbortLowerEl,
            _ => ExceptionClass::Other,
        }
    }
}

/// ESR ISS bit 6 (WnR): the faulting data access was a write.
const ESR_WNR: u64 = 1 << 6;

/// Why user code entered the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCause {
    /// A system call request.
    Syscall,
    /// Access to an unmapped or protected page.
    PageFault { addr: UserAddr, write: bool },
    /// Any other exception raised by user code.
    Fatal { syndrome: u64 },
}

impl TrapCause {
    /// Classify an ARM64 exception from a lower EL by its syndrome and
    /// fault address registers.
    pub fn from_esr(esr: u64, far: u64) -> Self {
        match ExceptionClass::from(esr) {
            ExceptionClass::SvcAarch64 => Self::Syscall,
            ExceptionClass::DataAbortLowerEl => Self::PageFault {
                addr: UserAddr::new(far as usize),
                write: esr & ESR_WNR != 0,
            },
            ExceptionClass::InstructionAbortLowerEl => Self::PageFault {
                addr: UserAddr::new(far as usize),
                write: false,
            },
            _ => Self::Fatal { syndrome: esr },
        }
    }
}

impl fmt::Display for TrapCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syscall => write!(f, "system call"),
            Self::PageFault { addr, write: true } => write!(f, "page fault writing {}", addr),
            Self::PageFault { addr, write: false } => write!(f, "page fault reading {}", addr),
            Self::Fatal { syndrome } => write!(f, "fatal exception (ESR {:#x})", syndrome),
        }
    }
}

/// Handle a trap taken from user mode.
///
/// The caller acts on the returned [`Disposition`]: resume the program,
/// destroy its thread, or power off.
pub fn handle_user_trap<FS: FileSystem>(
    dispatcher: &Dispatcher<'_, FS>,
    cause: TrapCause,
    frame: &mut TrapFrame,
    proc: &mut Process<FS::File>,
    mem: &mut dyn UserMemory,
) -> Disposition {
    match cause {
        TrapCause::Syscall => dispatcher.dispatch(frame, proc, mem),
        TrapCause::PageFault { .. } | TrapCause::Fatal { .. } => dispatcher.kill(proc, &cause),
    }
}
