//! Error types for the buffer pool and its page-file collaborator.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Error surface for buffer pool and page-file operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied parameter violated a documented precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was attempted on a pool that has not been initialized,
    /// or that has already been shut down.
    #[error("buffer pool is not initialized")]
    PoolNotInitialized,

    /// The page file named at construction does not exist on disk.
    #[error("page file not found: {0}")]
    PageFileNotFound(String),

    /// A page read from the page file failed.
    #[error("failed to read page {0}")]
    ReadFailed(u64),

    /// A page write to the page file failed.
    #[error("failed to write page {0}")]
    WriteFailed(u64),

    /// `shutdown` was attempted while one or more frames were still pinned.
    #[error("buffer pool has pinned pages, cannot shut down")]
    PinnedPagesInBuffer,

    /// `mark_dirty` referenced a page that is not currently resident.
    #[error("page {0} is not resident in the buffer pool")]
    PageNotInPool(u64),

    /// Frame table or frame buffer allocation failed.
    #[error("out of memory allocating buffer pool state")]
    OutOfMemory,

    /// A miss occurred with the frame table full and no unpinned frame
    /// available for eviction.
    #[error("no unpinned frame available for eviction")]
    NoVictimAvailable,

    /// Underlying I/O failure not otherwise classified above (e.g. failure
    /// to open or create the page file).
    #[error("page file I/O error: {0}")]
    Io(#[from] std::io::Error),
}
