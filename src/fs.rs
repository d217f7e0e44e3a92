//! Filesystem collaborator interface
//!
//! The kernel filesystem lives outside this crate. These traits are the
//! contract the syscall layer relies on; the file objects behind them are
//! assumed to synchronize themselves when several descriptors refer to
//! the same underlying file.

/// A file object returned by a successful [`FileSystem::open`].
///
/// Exactly one descriptor table owns each object from open to close.
pub trait OpenFile {
    /// Read into `buf` from the current position, advancing it.
    /// Returns the number of bytes read (0 at end of file).
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Write `buf` at the current position, advancing it.
    /// Returns the number of bytes written, which may be short.
    fn write(&mut self, buf: &[u8]) -> usize;

    /// Length of the file in bytes.
    fn length(&self) -> u32;

    /// Move the read/write cursor to `pos` bytes from the start.
    fn seek(&mut self, pos: u32);

    /// Current cursor offset in bytes from the start.
    fn tell(&self) -> u32;

    /// Release the file object. Consumes it, so it cannot happen twice.
    fn close(self);
}

/// Name-based filesystem operations.
pub trait FileSystem {
    /// The file object type handed out by [`FileSystem::open`].
    type File: OpenFile;

    /// Create `name` with `initial_size` bytes. Does not open it.
    fn create(&self, name: &str, initial_size: u32) -> bool;

    /// Unlink `name`. Files already open under that name keep working.
    fn remove(&self, name: &str) -> bool;

    /// Open `name`, or None if it does not exist or cannot be opened.
    fn open(&self, name: &str) -> Option<Self::File>;
}
