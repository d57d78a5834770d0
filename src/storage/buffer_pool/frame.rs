//! Frame descriptors: the buffer pool's per-slot bookkeeping.

use crate::storage::page::{PageNumber, PAGE_SIZE};

/// A single slot in the frame table.
///
/// A frame is either empty (`page_number` is `None`, no buffer allocated) or
/// loaded (`page_number` is `Some`, `data` holds exactly `PAGE_SIZE` bytes).
/// `install` and `reset` are the only two entry points that touch
/// `page_number`/`data` together, which keeps the two fields in lockstep by
/// construction rather than by runtime assertion.
#[derive(Debug)]
pub struct Frame {
    /// Position of this frame in the table. Immutable once created.
    pub frame_index: usize,
    /// The page currently loaded in this frame, if any.
    pub page_number: Option<PageNumber>,
    /// Raw page bytes. `Some` exactly when `page_number` is `Some`.
    pub data: Option<Box<[u8; PAGE_SIZE]>>,
    /// True iff `data` has been modified since it was loaded or last written.
    pub dirty: bool,
    /// Number of outstanding pins.
    pub pin_count: usize,
    /// CLOCK-only: grants one reprieve before eviction.
    pub second_chance: bool,
    /// LRU-only: monotone "last touched" stamp.
    pub recent_hit: u64,
}

impl Frame {
    /// Creates a new, empty frame at `frame_index`.
    #[must_use]
    pub fn empty(frame_index: usize) -> Self {
        Self {
            frame_index,
            page_number: None,
            data: None,
            dirty: false,
            pin_count: 0,
            second_chance: false,
            recent_hit: 0,
        }
    }

    /// Whether this frame currently holds no page.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.page_number.is_none()
    }

    /// Whether this frame is a legal eviction candidate (I3: unpinned).
    #[must_use]
    pub fn is_evictable(&self) -> bool {
        self.pin_count == 0
    }

    /// Installs `page_number` with freshly read `data`, resetting pin/dirty
    /// and per-policy metadata to their post-install values. The caller is
    /// responsible for having already performed the disk read.
    pub fn install(&mut self, page_number: PageNumber, data: Box<[u8; PAGE_SIZE]>) {
        self.page_number = Some(page_number);
        self.data = Some(data);
        self.pin_count = 1;
        self.dirty = false;
        self.second_chance = false;
    }

    /// Returns the frame to the empty state (I1), dropping its buffer.
    pub fn reset(&mut self) {
        self.page_number = None;
        self.data = None;
        self.dirty = false;
        self.pin_count = 0;
        self.second_chance = false;
        self.recent_hit = 0;
    }

    pub fn pin(&mut self) {
        self.pin_count += 1;
    }

    /// Decrements the pin count, saturating at zero. Double-unpin is a
    /// tolerated no-op, never an underflow.
    pub fn unpin(&mut self) {
        self.pin_count = self.pin_count.saturating_sub(1);
    }
}
