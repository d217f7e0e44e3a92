//! Trap frame decoding
//!
//! The user program pushes the system call number followed by its
//! arguments, one 32-bit word each, and traps with the stack pointer at
//! the number:
//!
//! ```text
//!   sp + 12 │ arg 3 │
//!   sp + 8  │ arg 2 │
//!   sp + 4  │ arg 1 │
//!   sp      │  nr   │
//! ```
//!
//! Arguments always travel on the user stack, never in registers, so the
//! frame only carries the stack pointer and the result register (x0 on
//! AArch64).
//!
//! Decoding validates each slot before reading it and validates every
//! string or buffer argument before exposing it, so handlers only ever
//! see kernel copies or checked [`UserRange`]s.

use alloc::string::String;

use log::debug;

use super::error::SyscallError;
use super::validate::{
    read_cstr, read_word, validate_range, PageFlags, UserMemory, UserRange, WORD_SIZE,
};
use crate::fd::Fd;
use crate::process::Pid;

/// System call numbers of the user-program ABI.
pub mod numbers {
    pub const SYS_HALT: u32 = 0;
    pub const SYS_EXIT: u32 = 1;
    pub const SYS_EXEC: u32 = 2;
    pub const SYS_WAIT: u32 = 3;
    pub const SYS_CREATE: u32 = 4;
    pub const SYS_REMOVE: u32 = 5;
    pub const SYS_OPEN: u32 = 6;
    pub const SYS_FILESIZE: u32 = 7;
    pub const SYS_READ: u32 = 8;
    pub const SYS_WRITE: u32 = 9;
    pub const SYS_SEEK: u32 = 10;
    pub const SYS_TELL: u32 = 11;
    pub const SYS_CLOSE: u32 = 12;
}

/// Register state the trap entry saves for a system call.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    /// User stack pointer at the trap (SP_EL0); points at the call number.
    pub sp: usize,
    /// Return value register.
    pub ret: u32,
}

impl TrapFrame {
    /// Frame for a trap taken with the user stack at `sp`.
    pub const fn new(sp: usize) -> Self {
        Self { sp, ret: 0 }
    }

    /// Store a result in the return register.
    #[inline]
    pub fn set_return(&mut self, value: i32) {
        self.ret = value as u32;
    }

    /// The return register read as a signed value.
    #[inline]
    pub fn return_value(&self) -> i32 {
        self.ret as i32
    }
}

/// A decoded system call with validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Syscall {
    Halt,
    Exit { status: i32 },
    Exec { cmdline: String },
    Wait { pid: Pid },
    Create { name: String, initial_size: u32 },
    Remove { name: String },
    Open { name: String },
    Filesize { fd: Fd },
    /// `buf` is checked writable: the kernel fills it.
    Read { fd: Fd, buf: UserRange },
    Write { fd: Fd, buf: UserRange },
    Seek { fd: Fd, position: u32 },
    Tell { fd: Fd },
    Close { fd: Fd },
}

/// Typed access to the argument slots above the user stack pointer.
struct Args<'m> {
    sp: usize,
    mem: &'m dyn UserMemory,
}

impl Args<'_> {
    fn word(&self, slot: usize) -> Result<u32, SyscallError> {
        let addr = slot
            .checked_mul(WORD_SIZE)
            .and_then(|offset| self.sp.checked_add(offset))
            .ok_or(SyscallError::Efault)?;
        read_word(self.mem, addr)
    }

    fn int(&self, slot: usize) -> Result<i32, SyscallError> {
        self.word(slot).map(|w| w as i32)
    }

    fn fd(&self, slot: usize) -> Result<Fd, SyscallError> {
        self.int(slot).map(Fd::new)
    }

    fn string(&self, slot: usize) -> Result<String, SyscallError> {
        let ptr = self.word(slot)?;
        read_cstr(self.mem, ptr as usize)
    }

    fn buffer(
        &self,
        ptr_slot: usize,
        len_slot: usize,
        required: PageFlags,
    ) -> Result<UserRange, SyscallError> {
        let ptr = self.word(ptr_slot)?;
        let len = self.word(len_slot)?;
        validate_range(self.mem, ptr as usize, len as usize, required)
    }
}

impl Syscall {
    /// Decode the call at the frame's stack pointer.
    ///
    /// Fails with `Efault` if any slot or pointer argument is invalid and
    /// `Enosys` for an unknown call number.
    pub fn decode(frame: &TrapFrame, mem: &dyn UserMemory) -> Result<Self, SyscallError> {
        use numbers::*;

        let args = Args { sp: frame.sp, mem };
        let call = match args.word(0)? {
            SYS_HALT => Self::Halt,
            SYS_EXIT => Self::Exit { status: args.int(1)? },
            SYS_EXEC => Self::Exec { cmdline: args.string(1)? },
            SYS_WAIT => Self::Wait { pid: Pid::new(args.int(1)?) },
            SYS_CREATE => Self::Create {
                name: args.string(1)?,
                initial_size: args.word(2)?,
            },
            SYS_REMOVE => Self::Remove { name: args.string(1)? },
            SYS_OPEN => Self::Open { name: args.string(1)? },
            SYS_FILESIZE => Self::Filesize { fd: args.fd(1)? },
            SYS_READ => Self::Read {
                fd: args.fd(1)?,
                buf: args.buffer(2, 3, PageFlags::WRITABLE)?,
            },
            SYS_WRITE => Self::Write {
                fd: args.fd(1)?,
                buf: args.buffer(2, 3, PageFlags::empty())?,
            },
            SYS_SEEK => Self::Seek {
                fd: args.fd(1)?,
                position: args.word(2)?,
            },
            SYS_TELL => Self::Tell { fd: args.fd(1)? },
            SYS_CLOSE => Self::Close { fd: args.fd(1)? },
            unknown => {
                debug!("unknown syscall number {}", unknown);
                return Err(SyscallError::Enosys);
            }
        };
        Ok(call)
    }
}
