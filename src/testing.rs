//! In-memory collaborators for unit tests.

use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::string::{String, ToString};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, Thread};
use std::vec::Vec;

use spin::Mutex;

use crate::drivers::console::Console;
use crate::fs::{FileSystem, OpenFile};
use crate::mm::address::{UserAddr, PAGE_SIZE};
use crate::process::{Lifecycle, Pid, ProcessHost};
use crate::syscall::validate::{PageFlags, UserMemory};

/// A page-granular user address space. Touching an unmapped page from
/// `read`/`write` panics, which exposes any unvalidated access.
pub struct FakeMemory {
    pages: BTreeMap<usize, (PageFlags, Box<[u8; PAGE_SIZE]>)>,
}

impl FakeMemory {
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    /// Map every page touched by `[addr, addr + len)` with `flags`.
    pub fn map(&mut self, addr: usize, len: usize, flags: PageFlags) {
        let first = addr / PAGE_SIZE;
        let last = (addr + len - 1) / PAGE_SIZE;
        for page in first..=last {
            self.pages
                .entry(page)
                .and_modify(|(f, _)| *f = flags)
                .or_insert_with(|| (flags, Box::new([0; PAGE_SIZE])));
        }
    }

    fn byte_mut(&mut self, addr: usize) -> &mut u8 {
        let (_, page) = self
            .pages
            .get_mut(&(addr / PAGE_SIZE))
            .unwrap_or_else(|| panic!("access to unmapped user address {:#x}", addr));
        &mut page[addr % PAGE_SIZE]
    }

    fn byte(&self, addr: usize) -> u8 {
        let (_, page) = self
            .pages
            .get(&(addr / PAGE_SIZE))
            .unwrap_or_else(|| panic!("access to unmapped user address {:#x}", addr));
        page[addr % PAGE_SIZE]
    }

    /// Store bytes regardless of page permissions.
    pub fn poke(&mut self, addr: usize, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            *self.byte_mut(addr + i) = b;
        }
    }

    /// Load bytes regardless of page permissions.
    pub fn peek(&self, addr: usize, len: usize) -> Vec<u8> {
        (0..len).map(|i| self.byte(addr + i)).collect()
    }

    /// Lay out little-endian words starting at `sp`.
    pub fn push_words(&mut self, sp: usize, words: &[u32]) {
        for (i, word) in words.iter().enumerate() {
            self.poke(sp + i * 4, &word.to_le_bytes());
        }
    }
}

impl UserMemory for FakeMemory {
    fn page_flags(&self, page: UserAddr) -> Option<PageFlags> {
        self.pages.get(&page.page_number()).map(|(flags, _)| *flags)
    }

    fn read(&self, addr: UserAddr, dst: &mut [u8]) {
        for (i, b) in dst.iter_mut().enumerate() {
            *b = self.byte(addr.as_usize() + i);
        }
    }

    fn write(&mut self, addr: UserAddr, src: &[u8]) {
        self.poke(addr.as_usize(), src);
    }
}

/// An in-memory filesystem that counts closes.
pub struct MemFs {
    files: Mutex<BTreeMap<String, Arc<Mutex<Vec<u8>>>>>,
    closes: Arc<AtomicUsize>,
    opens: AtomicUsize,
}

impl MemFs {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            closes: Arc::new(AtomicUsize::new(0)),
            opens: AtomicUsize::new(0),
        }
    }

    /// Files closed so far, across all handles.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Successful opens so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Create or replace `name` with `bytes`.
    pub fn put(&self, name: &str, bytes: &[u8]) {
        self.files
            .lock()
            .insert(name.to_string(), Arc::new(Mutex::new(bytes.to_vec())));
    }

    /// Current contents of `name`.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().get(name).map(|data| data.lock().clone())
    }
}

impl FileSystem for MemFs {
    type File = MemFile;

    fn create(&self, name: &str, initial_size: u32) -> bool {
        let mut files = self.files.lock();
        if name.is_empty() || files.contains_key(name) {
            return false;
        }
        files.insert(
            name.to_string(),
            Arc::new(Mutex::new(vec![0; initial_size as usize])),
        );
        true
    }

    fn remove(&self, name: &str) -> bool {
        self.files.lock().remove(name).is_some()
    }

    fn open(&self, name: &str) -> Option<MemFile> {
        let data = self.files.lock().get(name).cloned()?;
        self.opens.fetch_add(1, Ordering::SeqCst);
        Some(MemFile {
            data,
            pos: 0,
            closes: Arc::clone(&self.closes),
        })
    }
}

/// A handle on a [`MemFs`] file. Writes never extend the file.
pub struct MemFile {
    data: Arc<Mutex<Vec<u8>>>,
    pos: usize,
    closes: Arc<AtomicUsize>,
}

impl OpenFile for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let data = self.data.lock();
        let start = self.pos.min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.pos += n;
        n
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        let mut data = self.data.lock();
        let start = self.pos.min(data.len());
        let n = buf.len().min(data.len() - start);
        data[start..start + n].copy_from_slice(&buf[..n]);
        self.pos += n;
        n
    }

    fn length(&self) -> u32 {
        self.data.lock().len() as u32
    }

    fn seek(&mut self, pos: u32) {
        self.pos = pos as usize;
    }

    fn tell(&self) -> u32 {
        self.pos as u32
    }

    fn close(self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A console that records each burst and replays scripted keyboard input.
pub struct RecordingConsole {
    chunks: Mutex<Vec<Vec<u8>>>,
    input: Mutex<VecDeque<u8>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::with_input(b"")
    }

    pub fn with_input(input: &[u8]) -> Self {
        Self {
            chunks: Mutex::new(Vec::new()),
            input: Mutex::new(input.iter().copied().collect()),
        }
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.chunks.lock().iter().map(Vec::len).collect()
    }

    pub fn output(&self) -> Vec<u8> {
        self.chunks.lock().concat()
    }

    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output()).into_owned()
    }
}

impl Console for RecordingConsole {
    fn write_chunk(&self, buf: &[u8]) {
        self.chunks.lock().push(buf.to_vec());
    }

    fn read_char(&self) -> u8 {
        self.input.lock().pop_front().unwrap_or(0)
    }
}

type Program = dyn Fn(&str, Pid, Arc<Lifecycle>, &ThreadHost) + Send + Sync;

struct Inner {
    threads: Mutex<BTreeMap<Pid, Thread>>,
    next_pid: AtomicI32,
    program: Option<Box<Program>>,
}

thread_local! {
    static CURRENT: Cell<Option<Pid>> = const { Cell::new(None) };
}

/// A process host backed by std threads; block/unblock are park/unpark.
#[derive(Clone)]
pub struct ThreadHost {
    inner: Arc<Inner>,
}

impl ThreadHost {
    /// A host that cannot spawn programs.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A host whose spawned threads run `program(cmdline, pid, lifecycle, host)`.
    pub fn with_programs<P>(program: P) -> Self
    where
        P: Fn(&str, Pid, Arc<Lifecycle>, &ThreadHost) + Send + Sync + 'static,
    {
        Self::build(Some(Box::new(program)))
    }

    fn build(program: Option<Box<Program>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                threads: Mutex::new(BTreeMap::new()),
                next_pid: AtomicI32::new(100),
                program,
            }),
        }
    }

    /// Register the calling std thread as `pid`.
    pub fn adopt_current(&self, pid: Pid) {
        CURRENT.with(|current| current.set(Some(pid)));
        self.inner.threads.lock().insert(pid, thread::current());
    }

    /// Run `f` on a new std thread registered as `pid`.
    pub fn run_as<F>(&self, pid: Pid, f: F) -> JoinHandle<()>
    where
        F: FnOnce(&ThreadHost) + Send + 'static,
    {
        let host = self.clone();
        thread::spawn(move || {
            host.adopt_current(pid);
            f(&host);
        })
    }
}

impl ProcessHost for ThreadHost {
    fn spawn(&self, cmdline: &str, lifecycle: Arc<Lifecycle>) -> Option<Pid> {
        self.inner.program.as_ref()?;
        let pid = Pid::new(self.inner.next_pid.fetch_add(1, Ordering::SeqCst));
        let cmdline = cmdline.to_string();
        self.run_as(pid, move |host| {
            if let Some(program) = host.inner.program.as_ref() {
                program(&cmdline, pid, lifecycle, host);
            }
        });
        Some(pid)
    }

    fn current(&self) -> Pid {
        CURRENT
            .with(Cell::get)
            .expect("thread was not adopted by the ThreadHost")
    }

    fn block_current(&self) {
        thread::park();
    }

    fn unblock(&self, pid: Pid) {
        if let Some(thread) = self.inner.threads.lock().get(&pid) {
            thread.unpark();
        }
    }
}
