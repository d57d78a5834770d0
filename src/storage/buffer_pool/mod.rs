//! Buffer pool: the frame table, pin/unpin/dirty bookkeeping, and the
//! write-back discipline tying it to the page file.
//!
//! # Example
//!
//! ```no_run
//! use framepool::storage::buffer_pool::{BufferPool, BufferPoolBuilder};
//! use framepool::storage::page::PageNumber;
//!
//! # fn main() -> framepool::error::Result<()> {
//! let mut pool = BufferPoolBuilder::new()
//!     .file_name("pages.db")
//!     .num_pages(64)
//!     .build()?;
//!
//! let handle = pool.pin(PageNumber::new(0))?;
//! pool.page_data_mut(handle)?[0] = 0x42;
//! pool.mark_dirty(handle)?;
//! pool.unpin(handle)?;
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

mod frame;
mod replacer;

pub use frame::Frame;
pub use replacer::{ReplacementPolicy, Replacer};

use std::collections::HashMap;
use std::path::Path;

use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::storage::page::{PageFile, PageNumber, PAGE_SIZE};

/// Validated construction parameters for a [`BufferPool`], produced by
/// [`BufferPoolBuilder`].
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    file_name: String,
    num_pages: usize,
    policy: ReplacementPolicy,
}

/// Builder for [`BufferPoolConfig`] / [`BufferPool`].
///
/// Mirrors the validating-constructor idiom used elsewhere in this corpus
/// for buffer pool managers: collect the parameters, validate them once, and
/// only then hand them to the pool itself.
#[derive(Debug, Clone)]
pub struct BufferPoolBuilder {
    file_name: Option<String>,
    num_pages: Option<usize>,
    policy: ReplacementPolicy,
}

impl Default for BufferPoolBuilder {
    fn default() -> Self {
        Self {
            file_name: None,
            num_pages: None,
            policy: ReplacementPolicy::Lru,
        }
    }
}

impl BufferPoolBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use]
    pub fn num_pages(mut self, num_pages: usize) -> Self {
        self.num_pages = Some(num_pages);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: ReplacementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validates the collected parameters into a [`BufferPoolConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `file_name` is empty/unset or
    /// `num_pages` is zero/unset (spec §4.1 init preconditions).
    pub fn build_config(self) -> Result<BufferPoolConfig> {
        let file_name = self
            .file_name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::InvalidArgument("file_name must be non-empty".into()))?;
        let num_pages = self
            .num_pages
            .filter(|&n| n > 0)
            .ok_or_else(|| Error::InvalidArgument("num_pages must be greater than 0".into()))?;

        Ok(BufferPoolConfig {
            file_name,
            num_pages,
            policy: self.policy,
        })
    }

    /// Validates and constructs the pool in one step.
    ///
    /// # Errors
    ///
    /// See [`Self::build_config`] and [`BufferPool::init`].
    pub fn build(self) -> Result<BufferPool> {
        BufferPool::init(self.build_config()?)
    }
}

/// A client-held reference to a pinned page.
///
/// Deliberately a `Copy` token wrapping a [`PageNumber`] rather than a
/// borrowed reference: §4.4 requires `unpin` to be independently callable,
/// tolerant of being called on an already-unpinned page, and distinguishable
/// from `mark_dirty`, none of which a `Drop`-based guard can express cleanly.
/// Buffer access goes through [`BufferPool::page_data`] /
/// [`BufferPool::page_data_mut`], each borrowing the pool for exactly the
/// call — the borrow checker then statically prevents using the buffer
/// while a `&mut BufferPool` operation that could evict is in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle(PageNumber);

impl PageHandle {
    fn new(page_number: PageNumber) -> Self {
        Self(page_number)
    }

    #[must_use]
    pub fn page_number(&self) -> PageNumber {
        self.0
    }
}

/// Thin RAII convenience wrapper over [`PageHandle`] that unpins on drop.
/// Sugar, not the primary contract — obtained via [`BufferPool::pin_guard`].
pub struct PageGuard<'a> {
    pool: &'a mut BufferPool,
    handle: PageHandle,
}

impl PageGuard<'_> {
    #[must_use]
    pub fn page_number(&self) -> PageNumber {
        self.handle.page_number()
    }

    /// # Panics
    ///
    /// Panics if the guarded page was somehow evicted without going through
    /// `unpin` first — this cannot happen while the guard is held, since a
    /// pinned frame is never an eviction candidate (I3).
    #[must_use]
    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        self.pool
            .page_data(self.handle)
            .expect("a guarded page remains resident while pinned")
    }

    /// Returns a mutable view of the page buffer. Does not itself mark the
    /// page dirty — call [`Self::mark_dirty`] explicitly, matching the
    /// pool's separate `mark_dirty` operation.
    ///
    /// # Panics
    ///
    /// See [`Self::data`].
    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        self.pool
            .page_data_mut(self.handle)
            .expect("a guarded page remains resident while pinned")
    }

    pub fn mark_dirty(&mut self) {
        self.pool
            .mark_dirty(self.handle)
            .expect("a guarded page remains resident while pinned");
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        let _ = self.pool.unpin(self.handle);
    }
}

/// The buffer pool: frame table, replacement policy, and page-file
/// collaborator, composed behind the client API described in spec §4.
pub struct BufferPool {
    frames: Vec<Frame>,
    page_table: HashMap<PageNumber, usize>,
    replacer: Replacer,
    file_name: String,
    page_file: Option<PageFile>,
    recent_hit_counter: u64,
    read_io: u64,
    write_io: u64,
    initialized: bool,
}

impl BufferPool {
    /// Initializes a buffer pool from validated `config`.
    ///
    /// Allocates the frame table (all frames empty, I1) and resets all
    /// counters and cursors to zero. Does **not** open or otherwise touch
    /// the page file — the file is opened lazily on the first operation
    /// that actually needs disk I/O, and then kept open for the pool's
    /// lifetime (spec §9, "per-operation file open/close" design note).
    ///
    /// # Errors
    ///
    /// This constructor itself cannot fail once `config` is validated;
    /// `Result` is kept in the signature to mirror spec §4.1's contract
    /// (`InvalidArgument`/`OutOfMemory`), both of which are structurally
    /// ruled out by [`BufferPoolBuilder::build_config`] and by `Vec`
    /// allocation failure aborting the process rather than returning an
    /// error in safe Rust.
    pub fn init(config: BufferPoolConfig) -> Result<Self> {
        let frames = (0..config.num_pages).map(Frame::empty).collect();

        Ok(Self {
            frames,
            page_table: HashMap::with_capacity(config.num_pages),
            replacer: Replacer::new(config.policy),
            file_name: config.file_name,
            page_file: None,
            recent_hit_counter: 0,
            read_io: 0,
            write_io: 0,
            initialized: true,
        })
    }

    /// Number of frames in the table.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    /// Which replacement policy this pool was constructed with.
    #[must_use]
    pub fn policy(&self) -> ReplacementPolicy {
        self.replacer.policy()
    }

    fn require_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::PoolNotInitialized)
        }
    }

    fn bump_recent_hit_counter(&mut self) -> u64 {
        self.recent_hit_counter += 1;
        self.recent_hit_counter
    }

    fn ensure_page_file(&mut self) -> Result<&mut PageFile> {
        if self.page_file.is_none() {
            self.page_file = Some(PageFile::open(Path::new(&self.file_name))?);
        }
        Ok(self.page_file.as_mut().expect("just opened"))
    }

    /// Reads `page_number` fresh from the page file, growing it first if
    /// necessary. Does not touch frame or pool bookkeeping; callers account
    /// for `read_io` themselves on success.
    fn read_fresh_page(&mut self, page_number: PageNumber) -> Result<Box<[u8; PAGE_SIZE]>> {
        let page_file = self.ensure_page_file()?;
        page_file.ensure_capacity(page_number.index() + 1)?;
        let mut buf = Box::new([0u8; PAGE_SIZE]);
        page_file.read_block(page_number, &mut buf)?;
        Ok(buf)
    }

    /// Writes frame `frame_idx`'s buffer back unconditionally, increments
    /// `write_io`, and clears `dirty` (I5). Used by `force_page`,
    /// `force_flush_pool`, and eviction write-back.
    fn write_frame(&mut self, frame_idx: usize) -> Result<()> {
        let page_number = self.frames[frame_idx]
            .page_number
            .expect("write_frame called on a resident frame");
        let data = **self.frames[frame_idx]
            .data
            .as_ref()
            .expect("resident frame holds data");

        let page_file = self.ensure_page_file()?;
        page_file.ensure_capacity(page_number.index() + 1)?;
        page_file.write_block(page_number, &data)?;

        self.write_io += 1;
        self.frames[frame_idx].dirty = false;
        Ok(())
    }

    /// Pins `page_number`, loading it from disk on miss and evicting a
    /// victim if the table is full. See spec §4.2.
    ///
    /// # Errors
    ///
    /// `PoolNotInitialized`, `ReadFailed`, `WriteFailed` (victim flush),
    /// `NoVictimAvailable`.
    pub fn pin(&mut self, page_number: PageNumber) -> Result<PageHandle> {
        self.require_initialized()?;

        // 1. Hit lookup.
        if let Some(&frame_idx) = self.page_table.get(&page_number) {
            let counter = self.bump_recent_hit_counter();
            let frame = &mut self.frames[frame_idx];
            frame.pin();
            self.replacer.on_hit(frame, counter);
            trace!("pin hit: page {page_number} in frame {frame_idx}");
            return Ok(PageHandle::new(page_number));
        }

        // 2. Empty-frame install.
        if let Some(frame_idx) = self.frames.iter().position(Frame::is_empty) {
            trace!("pin miss (empty frame {frame_idx}): page {page_number}");
            return match self.read_fresh_page(page_number) {
                Ok(data) => {
                    self.read_io += 1;
                    let counter = self.bump_recent_hit_counter();
                    let frame = &mut self.frames[frame_idx];
                    frame.install(page_number, data);
                    self.replacer.on_install(frame, counter);
                    self.page_table.insert(page_number, frame_idx);
                    Ok(PageHandle::new(page_number))
                }
                Err(e) => {
                    self.frames[frame_idx].reset();
                    Err(e)
                }
            };
        }

        // 3. Eviction.
        let victim_idx = self
            .replacer
            .choose_victim(&mut self.frames)
            .ok_or(Error::NoVictimAvailable)?;

        if self.frames[victim_idx].dirty {
            if let Err(e) = self.write_frame(victim_idx) {
                warn!("victim write-back failed for frame {victim_idx}: {e}");
                return Err(e);
            }
        }

        let old_page_number = self.frames[victim_idx].page_number;

        match self.read_fresh_page(page_number) {
            Ok(data) => {
                self.read_io += 1;
                if let Some(old) = old_page_number {
                    self.page_table.remove(&old);
                }
                let counter = self.bump_recent_hit_counter();
                let frame = &mut self.frames[victim_idx];
                frame.install(page_number, data);
                self.replacer.on_install(frame, counter);
                self.page_table.insert(page_number, victim_idx);
                debug!("evicted frame {victim_idx} to install page {page_number}");
                Ok(PageHandle::new(page_number))
            }
            Err(e) => Err(e),
        }
    }

    /// Convenience over [`Self::pin`] that returns an RAII [`PageGuard`]
    /// instead of a bare [`PageHandle`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::pin`].
    pub fn pin_guard(&mut self, page_number: PageNumber) -> Result<PageGuard<'_>> {
        let handle = self.pin(page_number)?;
        Ok(PageGuard { pool: self, handle })
    }

    /// Unpins `handle`. Not-found or already-zero is silently tolerated
    /// (§4.4) — double-unpin is a benign no-op, not a fault.
    ///
    /// # Errors
    ///
    /// `PoolNotInitialized`.
    pub fn unpin(&mut self, handle: PageHandle) -> Result<()> {
        self.require_initialized()?;
        if let Some(&frame_idx) = self.page_table.get(&handle.page_number()) {
            self.frames[frame_idx].unpin();
        }
        Ok(())
    }

    /// Marks the page referenced by `handle` dirty.
    ///
    /// # Errors
    ///
    /// `PoolNotInitialized`; `PageNotInPool` if the page is not resident.
    pub fn mark_dirty(&mut self, handle: PageHandle) -> Result<()> {
        self.require_initialized()?;
        let frame_idx = *self
            .page_table
            .get(&handle.page_number())
            .ok_or_else(|| Error::PageNotInPool(handle.page_number().index()))?;
        self.frames[frame_idx].dirty = true;
        Ok(())
    }

    /// Writes `handle`'s page unconditionally (pinned or not), clearing
    /// `dirty`. A reference to a page that is not resident is a no-op
    /// returning success — the documented resolution of spec §9's open
    /// question (a well-formed caller cannot violate handle lifetime, so in
    /// practice this path is only reached by the stricter-implementation
    /// alternative the spec explicitly leaves open).
    ///
    /// # Errors
    ///
    /// `PoolNotInitialized`, `WriteFailed`.
    pub fn force_page(&mut self, handle: PageHandle) -> Result<()> {
        self.require_initialized()?;
        if let Some(&frame_idx) = self.page_table.get(&handle.page_number()) {
            self.write_frame(frame_idx)?;
        }
        Ok(())
    }

    /// Writes back every frame with `dirty == true` and `pin_count == 0`.
    /// Pinned dirty frames are skipped, not an error. Returns (and stops
    /// at) the first write error encountered.
    ///
    /// # Errors
    ///
    /// `PoolNotInitialized`, `WriteFailed`.
    pub fn force_flush_pool(&mut self) -> Result<()> {
        self.require_initialized()?;
        let candidates: Vec<usize> = self
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.dirty && f.pin_count == 0)
            .map(|(idx, _)| idx)
            .collect();

        for frame_idx in candidates {
            self.write_frame(frame_idx)?;
        }
        Ok(())
    }

    /// Flushes all dirty unpinned frames, then releases the pool's state.
    /// Fails without releasing anything if any frame is still pinned —
    /// callers must unpin and retry.
    ///
    /// # Errors
    ///
    /// `PoolNotInitialized`, `WriteFailed`, `PinnedPagesInBuffer`.
    pub fn shutdown(&mut self) -> Result<()> {
        self.require_initialized()?;
        self.force_flush_pool()?;

        if self.frames.iter().any(|f| f.pin_count > 0) {
            return Err(Error::PinnedPagesInBuffer);
        }

        self.frames.clear();
        self.page_table.clear();
        self.page_file = None;
        self.file_name.clear();
        self.initialized = false;
        Ok(())
    }

    /// Read-only view of page `handle`'s buffer.
    ///
    /// # Errors
    ///
    /// `PageNotInPool` if the page is not resident.
    pub fn page_data(&self, handle: PageHandle) -> Result<&[u8; PAGE_SIZE]> {
        let frame_idx = *self
            .page_table
            .get(&handle.page_number())
            .ok_or_else(|| Error::PageNotInPool(handle.page_number().index()))?;
        Ok(self.frames[frame_idx]
            .data
            .as_ref()
            .expect("resident frame holds data"))
    }

    /// Mutable view of page `handle`'s buffer. Does not itself set `dirty`
    /// — call [`Self::mark_dirty`] separately.
    ///
    /// # Errors
    ///
    /// `PageNotInPool` if the page is not resident.
    pub fn page_data_mut(&mut self, handle: PageHandle) -> Result<&mut [u8; PAGE_SIZE]> {
        let frame_idx = *self
            .page_table
            .get(&handle.page_number())
            .ok_or_else(|| Error::PageNotInPool(handle.page_number().index()))?;
        Ok(self.frames[frame_idx]
            .data
            .as_mut()
            .expect("resident frame holds data"))
    }

    /// Snapshot of each frame's resident page number, `NO_PAGE` (`None`) if
    /// empty. Length `N`.
    #[must_use]
    pub fn frame_contents(&self) -> Vec<Option<PageNumber>> {
        self.frames.iter().map(|f| f.page_number).collect()
    }

    /// Snapshot of each frame's dirty flag. Length `N`.
    #[must_use]
    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.dirty).collect()
    }

    /// Snapshot of each frame's pin count. Length `N`.
    #[must_use]
    pub fn fix_counts(&self) -> Vec<usize> {
        self.frames.iter().map(|f| f.pin_count).collect()
    }

    /// Cumulative count of successful page reads from disk (I6).
    #[must_use]
    pub fn num_read_io(&self) -> u64 {
        self.read_io
    }

    /// Cumulative count of successful page writes to disk (I6).
    #[must_use]
    pub fn num_write_io(&self) -> u64 {
        self.write_io
    }
}
