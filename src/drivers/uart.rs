//! PL011 UART Driver for QEMU virt machine
//!
//! Serial console for user program I/O and kernel log output.
//!
//! # Memory Map (QEMU virt)
//! - Base address: 0x0900_0000
//! - Register size: 0x1000 bytes
//!
//! # Security Considerations
//! - Unsafe code is limited to volatile MMIO accesses
//! - Uses spinlock for thread-safe access
//! - Log records and user output share the device but never interleave
//!   within one burst

use core::fmt::{self, Write};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

use super::console::Console;

/// QEMU virt machine PL011 UART base address
const UART_BASE: usize = 0x0900_0000;

/// PL011 Register offsets
mod regs {
    /// Data Register - read/write data
    pub const DR: usize = 0x00;
    /// Flag Register - status flags
    pub const FR: usize = 0x18;
}

/// Flag Register bits
mod flags {
    /// Receive FIFO empty
    pub const RXFE: u32 = 1 << 4;
    /// Transmit FIFO full
    pub const TXFF: u32 = 1 << 5;
}

/// PL011 UART driver
pub struct Uart {
    base: usize,
    initialized: bool,
}

impl Uart {
    /// Create a new UART instance (not yet initialized)
    pub const fn new(base: usize) -> Self {
        Self {
            base,
            initialized: false,
        }
    }

    /// Initialize the UART
    ///
    /// # Safety
    /// - Must only be called once
    /// - `base` must point at a mapped PL011 register block
    pub unsafe fn init(&mut self) {
        // PL011 is already initialized by QEMU, just mark as ready
        self.initialized = true;
    }

    fn write_byte(&self, byte: u8) {
        if !self.initialized {
            return;
        }

        // SAFETY: init() established that base addresses a PL011 block;
        // FR and DR are within its register window.
        unsafe {
            let fr = (self.base + regs::FR) as *const u32;
            let dr = (self.base + regs::DR) as *mut u32;

            while core::ptr::read_volatile(fr) & flags::TXFF != 0 {
                core::hint::spin_loop();
            }

            core::ptr::write_volatile(dr, byte as u32);
        }
    }

    /// Block until a byte arrives on the receive FIFO.
    pub fn read_byte(&self) -> u8 {
        if !self.initialized {
            return 0;
        }

        // SAFETY: same register window as write_byte.
        unsafe {
            let fr = (self.base + regs::FR) as *const u32;
            let dr = (self.base + regs::DR) as *const u32;

            while core::ptr::read_volatile(fr) & flags::RXFE != 0 {
                core::hint::spin_loop();
            }

            (core::ptr::read_volatile(dr) & 0xFF) as u8
        }
    }

    /// Write raw bytes, expanding `\n` to `\r\n`.
    pub fn write_bytes(&self, bytes: &[u8]) {
        for &byte in bytes {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
    }
}

impl Write for Uart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

impl Console for Mutex<Uart> {
    fn write_chunk(&self, buf: &[u8]) {
        self.lock().write_bytes(buf);
    }

    fn read_char(&self) -> u8 {
        self.lock().read_byte()
    }
}

/// Global UART instance protected by spinlock
pub static UART: Mutex<Uart> = Mutex::new(Uart::new(UART_BASE));

/// `log` backend printing `[LEVEL] target: message` on the UART.
pub struct UartLogger;

impl Log for UartLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut uart = UART.lock();
        let _ = writeln!(
            uart,
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: UartLogger = UartLogger;

/// Route `log` records to the UART at `level` and above.
///
/// The UART must already be initialized.
pub fn init_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
