//! Host-side stand-ins for the collaborators the syscall layer consumes.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, Thread};

use crate::config::Config;
use crate::drivers::Console;
use crate::fs::{File, FileHandle, FileSystem};
use crate::kernel::{Kernel, LoadError, Platform};
use crate::mm::{AddressSpace, PageFlags, Translation, VirtAddr, PAGE_SIZE};
use crate::proc::{Pid, Process};
use crate::sync::{Parker, ThreadId};

/// Top page of the user stack.
pub const STACK_PAGE: usize = 0xbfff_f000;
/// Stack pointer used for test traps.
pub const ESP: usize = 0xbfff_ff00;
/// A writable data page.
pub const DATA: usize = 0x0804_8000;
/// A read-only page just below `DATA`.
pub const RODATA: usize = 0x0804_7000;

const USER_RW: PageFlags = PageFlags::PRESENT
    .union(PageFlags::WRITABLE)
    .union(PageFlags::USER);
const USER_RO: PageFlags = PageFlags::PRESENT.union(PageFlags::USER);

struct MockPage {
    frame: NonNull<[u8; PAGE_SIZE]>,
    flags: PageFlags,
}

/// A sparse user address space backed by heap frames.
///
/// Frames are only ever reached through raw pointers, so aliases handed out
/// by `translate` stay valid while the test pokes and peeks.
pub struct MockSpace {
    pages: RefCell<BTreeMap<usize, MockPage>>,
}

impl MockSpace {
    pub fn new() -> Self {
        Self {
            pages: RefCell::new(BTreeMap::new()),
        }
    }

    /// Stack page, `DATA` and `RODATA` mapped.
    pub fn user() -> Self {
        let space = Self::new();
        space.map_rw(STACK_PAGE);
        space.map_rw(DATA);
        space.map(RODATA, USER_RO);
        space
    }

    pub fn map_rw(&self, addr: usize) {
        self.map(addr, USER_RW);
    }

    pub fn map(&self, addr: usize, flags: PageFlags) {
        let page = VirtAddr::new(addr).page_number();
        let mut pages = self.pages.borrow_mut();
        if let Some(existing) = pages.get_mut(&page) {
            existing.flags = flags;
            return;
        }
        let frame = NonNull::from(Box::leak(Box::new([0u8; PAGE_SIZE])));
        pages.insert(page, MockPage { frame, flags });
    }

    fn byte(&self, addr: usize) -> *mut u8 {
        let addr = VirtAddr::new(addr);
        let pages = self.pages.borrow();
        let page = pages
            .get(&addr.page_number())
            .unwrap_or_else(|| panic!("{} is not mapped", addr));
        // SAFETY: `page_offset` is below `PAGE_SIZE`.
        unsafe { page.frame.as_ptr().cast::<u8>().add(addr.page_offset()) }
    }

    /// Store bytes, ignoring page permissions.
    pub fn poke(&self, addr: usize, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            // SAFETY: `byte` points into a live frame.
            unsafe { self.byte(addr + i).write(b) };
        }
    }

    pub fn peek(&self, addr: usize, len: usize) -> Vec<u8> {
        // SAFETY: `byte` points into a live frame.
        (0..len).map(|i| unsafe { self.byte(addr + i).read() }).collect()
    }

    /// Store little-endian words, as a user program pushing arguments would.
    pub fn push_words(&self, addr: usize, words: &[u32]) {
        for (i, word) in words.iter().enumerate() {
            self.poke(addr + i * 4, &word.to_le_bytes());
        }
    }
}

impl Drop for MockSpace {
    fn drop(&mut self) {
        for (_, page) in std::mem::take(self.pages.get_mut()) {
            // SAFETY: The frame came from `Box::leak` in `map`.
            drop(unsafe { Box::from_raw(page.frame.as_ptr()) });
        }
    }
}

// SAFETY: Frames are only freed when the space itself is dropped.
unsafe impl AddressSpace for MockSpace {
    fn translate(&self, addr: VirtAddr) -> Option<Translation> {
        let pages = self.pages.borrow();
        let page = pages.get(&addr.page_number())?;
        // SAFETY: `page_offset` is below `PAGE_SIZE`.
        let ptr = unsafe { page.frame.as_ptr().cast::<u8>().add(addr.page_offset()) };
        let alias = NonNull::new(ptr)?;
        Some(Translation {
            alias,
            flags: page.flags,
        })
    }
}

struct Inode {
    data: Mutex<Vec<u8>>,
    deny_write: AtomicUsize,
}

#[derive(Default)]
struct FsState {
    files: Mutex<BTreeMap<String, Arc<Inode>>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

/// In-memory flat filesystem. Files never grow past their created size.
#[derive(Default)]
pub struct MockFs {
    state: Arc<FsState>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, name: &str, contents: &[u8]) {
        let inode = Arc::new(Inode {
            data: Mutex::new(contents.to_vec()),
            deny_write: AtomicUsize::new(0),
        });
        self.state.files.lock().unwrap().insert(name.to_string(), inode);
    }

    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        let files = self.state.files.lock().unwrap();
        files.get(name).map(|inode| inode.data.lock().unwrap().clone())
    }

    /// Successful opens so far.
    pub fn open_count(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    /// Handles dropped so far.
    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

impl FileSystem for MockFs {
    fn create(&self, name: &str, initial_size: u32) -> bool {
        let mut files = self.state.files.lock().unwrap();
        if name.is_empty() || files.contains_key(name) {
            return false;
        }
        let inode = Arc::new(Inode {
            data: Mutex::new(vec![0; initial_size as usize]),
            deny_write: AtomicUsize::new(0),
        });
        files.insert(name.to_string(), inode);
        true
    }

    fn remove(&self, name: &str) -> bool {
        self.state.files.lock().unwrap().remove(name).is_some()
    }

    fn open(&self, name: &str) -> Option<FileHandle> {
        let inode = Arc::clone(self.state.files.lock().unwrap().get(name)?);
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(MockFile {
            inode,
            fs: Arc::clone(&self.state),
            position: 0,
            denying: false,
        }))
    }
}

struct MockFile {
    inode: Arc<Inode>,
    fs: Arc<FsState>,
    position: u32,
    denying: bool,
}

impl File for MockFile {
    fn length(&self) -> u32 {
        self.inode.data.lock().unwrap().len() as u32
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let data = self.inode.data.lock().unwrap();
        let start = (self.position as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.position += n as u32;
        n
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        if self.inode.deny_write.load(Ordering::SeqCst) > 0 {
            return 0;
        }
        let mut data = self.inode.data.lock().unwrap();
        let start = (self.position as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        data[start..start + n].copy_from_slice(&buf[..n]);
        self.position += n as u32;
        n
    }

    fn seek(&mut self, position: u32) {
        self.position = position;
    }

    fn tell(&self) -> u32 {
        self.position
    }

    fn deny_write(&mut self) {
        if !self.denying {
            self.denying = true;
            self.inode.deny_write.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn allow_write(&mut self) {
        if self.denying {
            self.denying = false;
            self.inode.deny_write.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MockFile {
    fn drop(&mut self) {
        self.allow_write();
        self.fs.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Console with scripted input and captured output.
#[derive(Default)]
pub struct MockConsole {
    input: Mutex<VecDeque<u8>>,
    output: Mutex<Vec<u8>>,
}

impl MockConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self, bytes: &[u8]) {
        self.input.lock().unwrap().extend(bytes.iter().copied());
    }

    pub fn pending_input(&self) -> usize {
        self.input.lock().unwrap().len()
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output.lock().unwrap()).into_owned()
    }
}

impl Console for MockConsole {
    fn read_byte(&self) -> u8 {
        self.input
            .lock()
            .unwrap()
            .pop_front()
            .expect("console input exhausted")
    }

    fn write_bytes(&self, bytes: &[u8]) {
        self.output.lock().unwrap().extend_from_slice(bytes);
    }
}

static NEXT_THREAD: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: ThreadId = ThreadId(NEXT_THREAD.fetch_add(1, Ordering::Relaxed));
}

/// `Parker` over `std::thread::park`.
#[derive(Default)]
pub struct StdParker {
    threads: Mutex<HashMap<ThreadId, Thread>>,
}

impl StdParker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Parker for StdParker {
    fn current(&self) -> ThreadId {
        let id = THREAD_ID.with(|id| *id);
        self.threads
            .lock()
            .unwrap()
            .entry(id)
            .or_insert_with(thread::current);
        id
    }

    fn park(&self) {
        thread::park();
    }

    fn unpark(&self, thread: ThreadId) {
        if let Some(handle) = self.threads.lock().unwrap().get(&thread) {
            handle.unpark();
        }
    }
}

/// Platform whose loader records what it was asked to run.
#[derive(Default)]
pub struct MockPlatform {
    pub fs: MockFs,
    pub console: MockConsole,
    pub parker: StdParker,
    loads: Mutex<Vec<(Pid, String)>>,
    fail_next_load: AtomicBool,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful loads, in order.
    pub fn loads(&self) -> Vec<(Pid, String)> {
        self.loads.lock().unwrap().clone()
    }

    pub fn fail_next_load(&self) {
        self.fail_next_load.store(true, Ordering::SeqCst);
    }
}

impl Platform for MockPlatform {
    fn filesystem(&self) -> &dyn FileSystem {
        &self.fs
    }

    fn console(&self) -> &dyn Console {
        &self.console
    }

    fn parker(&self) -> &dyn Parker {
        &self.parker
    }

    fn load(&self, child: &Arc<Process>, cmdline: &str) -> Result<(), LoadError> {
        if self.fail_next_load.swap(false, Ordering::SeqCst) {
            return Err(LoadError);
        }
        self.loads
            .lock()
            .unwrap()
            .push((child.pid(), cmdline.to_string()));
        Ok(())
    }

    fn exit_thread(&self) -> ! {
        panic!("exit_thread called on the test platform");
    }

    fn power_off(&self) -> ! {
        panic!("power_off called on the test platform");
    }
}

pub fn test_kernel() -> Arc<Kernel<MockPlatform>> {
    Arc::new(Kernel::new(MockPlatform::new(), Config::default()))
}
