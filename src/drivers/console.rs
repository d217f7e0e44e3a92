//! Console device interface
//!
//! Descriptor 0 reads from the keyboard and descriptor 1 writes to the
//! console. The device accepts output in bounded bursts so that one large
//! write cannot monopolize it.

use core::fmt;

/// Largest burst handed to [`Console::write_chunk`] by this crate.
pub const CONSOLE_BURST: usize = 100;

/// The console device collaborator.
pub trait Console {
    /// Emit one burst of output. `buf` is at most `CONSOLE_BURST` bytes when
    /// called from this crate.
    fn write_chunk(&self, buf: &[u8]);

    /// Block until a character is available and return it.
    fn read_char(&self) -> u8;
}

/// Write `data` to the console in bursts of at most `CONSOLE_BURST` bytes.
pub fn write_chunked(console: &dyn Console, data: &[u8]) {
    for chunk in data.chunks(CONSOLE_BURST) {
        console.write_chunk(chunk);
    }
}

/// `fmt::Write` adapter over a console.
pub struct ConsoleWriter<'a>(pub &'a dyn Console);

impl fmt::Write for ConsoleWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        write_chunked(self.0, s.as_bytes());
        Ok(())
    }
}
