//! System Call Handler
//!
//! Dispatches decoded system calls and implements the individual services.
//!
//! # Security Considerations
//! - Arguments arrive already validated by `Syscall::decode`
//! - A decode failure kills the caller before any service runs
//! - Each call is one closed match arm; nothing falls through
//! - Unknown descriptors fail the call, never the process

use alloc::vec;
use core::fmt;

use log::{info, trace};

use super::call::{Syscall, TrapFrame};
use super::validate::{UserMemory, UserRange};
use crate::drivers::console::{Console, CONSOLE_BURST};
use crate::fd::{Fd, TableFull};
use crate::fs::{FileSystem, OpenFile};
use crate::mm::PAGE_SIZE;
use crate::process::{Process, ProcessHost};

/// Result returned to user programs on failure.
const FAILURE: i32 = -1;

/// Largest transfer one read or write performs, so that its byte count
/// always fits the non-negative range of the return register.
const MAX_TRANSFER: usize = i32::MAX as usize;

/// A file size or offset as a return value, saturating at `i32::MAX`.
fn file_result(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// What the trap exit path must do after a system call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Return to user mode; the result, if any, is in the frame.
    Resume,
    /// The process has been torn down with this status; destroy its thread.
    Exited(i32),
    /// Power the machine off.
    PowerOff,
}

/// Routes system calls from one process to the kernel's collaborators.
pub struct Dispatcher<'k, FS: FileSystem> {
    fs: &'k FS,
    console: &'k dyn Console,
    host: &'k dyn ProcessHost,
}

impl<'k, FS: FileSystem> Dispatcher<'k, FS> {
    /// Create a dispatcher over the kernel's filesystem, console and
    /// scheduler.
    pub fn new(fs: &'k FS, console: &'k dyn Console, host: &'k dyn ProcessHost) -> Self {
        Self { fs, console, host }
    }

    /// Handle the system call described by `frame` on behalf of `proc`.
    ///
    /// `mem` is `proc`'s address space.
    pub fn dispatch(
        &self,
        frame: &mut TrapFrame,
        proc: &mut Process<FS::File>,
        mem: &mut dyn UserMemory,
    ) -> Disposition {
        let call = match Syscall::decode(frame, &*mem) {
            Ok(call) => call,
            Err(err) => return self.kill(proc, &err),
        };
        trace!("{} (pid {}): {:?}", proc.name(), proc.pid(), call);

        let result = match call {
            Syscall::Halt => {
                info!("halt requested by {}", proc.name());
                return Disposition::PowerOff;
            }
            Syscall::Exit { status } => {
                let status = proc.terminate(status, self.console, self.host);
                return Disposition::Exited(status);
            }
            Syscall::Exec { cmdline } => Some(proc.exec(&cmdline, self.host).as_i32()),
            Syscall::Wait { pid } => Some(proc.wait(pid, self.host)),
            Syscall::Create { name, initial_size } => {
                Some(self.fs.create(&name, initial_size) as i32)
            }
            Syscall::Remove { name } => Some(self.fs.remove(&name) as i32),
            Syscall::Open { name } => Some(self.open(proc, &name)),
            Syscall::Filesize { fd } => Some(
                proc.files()
                    .lookup(fd)
                    .map_or(FAILURE, |file| file_result(file.length())),
            ),
            Syscall::Read { fd, buf } => Some(self.read(proc, mem, fd, buf)),
            Syscall::Write { fd, buf } => Some(self.write(proc, &*mem, fd, buf)),
            Syscall::Seek { fd, position } => {
                if let Ok(file) = proc.files_mut().lookup_mut(fd) {
                    file.seek(position);
                }
                None
            }
            Syscall::Tell { fd } => Some(
                proc.files()
                    .lookup(fd)
                    .map_or(FAILURE, |file| file_result(file.tell())),
            ),
            Syscall::Close { fd } => {
                if let Err(err) = proc.files_mut().release(fd) {
                    trace!("{}: close {}: {}", proc.name(), fd, err);
                }
                None
            }
        };

        if let Some(value) = result {
            frame.set_return(value);
        }
        Disposition::Resume
    }

    /// Terminate `proc` after a fatal error, through the normal exit path.
    pub fn kill(&self, proc: &mut Process<FS::File>, reason: &dyn fmt::Display) -> Disposition {
        Disposition::Exited(proc.kill(reason, self.console, self.host))
    }

    fn open(&self, proc: &mut Process<FS::File>, name: &str) -> i32 {
        let Some(file) = self.fs.open(name) else {
            return FAILURE;
        };
        match proc.files_mut().allocate(file) {
            Ok(fd) => fd.as_i32(),
            Err(TableFull(file)) => {
                file.close();
                FAILURE
            }
        }
    }

    fn read(
        &self,
        proc: &mut Process<FS::File>,
        mem: &mut dyn UserMemory,
        fd: Fd,
        buf: UserRange,
    ) -> i32 {
        let buf = buf.truncated(MAX_TRANSFER);
        if fd == Fd::STDIN {
            let mut bounce = vec![0u8; buf.len().min(PAGE_SIZE)];
            for chunk in buf.chunks(PAGE_SIZE) {
                let data = &mut bounce[..chunk.len()];
                for byte in data.iter_mut() {
                    *byte = self.console.read_char();
                }
                chunk.copy_out(mem, data);
            }
            return buf.len() as i32;
        }

        let Ok(file) = proc.files_mut().lookup_mut(fd) else {
            return FAILURE;
        };
        let mut bounce = vec![0u8; buf.len().min(PAGE_SIZE)];
        let mut total = 0;
        for chunk in buf.chunks(PAGE_SIZE) {
            let data = &mut bounce[..chunk.len()];
            let got = file.read(data);
            chunk.copy_out(mem, &data[..got]);
            total += got;
            if got < chunk.len() {
                break;
            }
        }
        total as i32
    }

    fn write(
        &self,
        proc: &mut Process<FS::File>,
        mem: &dyn UserMemory,
        fd: Fd,
        buf: UserRange,
    ) -> i32 {
        let buf = buf.truncated(MAX_TRANSFER);
        if fd == Fd::STDOUT {
            let mut burst = [0u8; CONSOLE_BURST];
            for chunk in buf.chunks(CONSOLE_BURST) {
                let data = &mut burst[..chunk.len()];
                chunk.copy_in(mem, data);
                self.console.write_chunk(data);
            }
            return buf.len() as i32;
        }

        let Ok(file) = proc.files_mut().lookup_mut(fd) else {
            return FAILURE;
        };
        let mut bounce = vec![0u8; buf.len().min(PAGE_SIZE)];
        let mut total = 0;
        for chunk in buf.chunks(PAGE_SIZE) {
            let data = &mut bounce[..chunk.len()];
            chunk.copy_in(mem, data);
            let written = file.write(data);
            total += written;
            if written < chunk.len() {
                break;
            }
        }
        total as i32
    }
}
