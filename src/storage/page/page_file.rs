//! Page-level I/O against a single backing file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage::page::{PageNumber, PAGE_SIZE};

/// A fixed-page-size file on disk, addressed by [`PageNumber`].
///
/// `PageFile` is the crate's sole collaborator for durable storage: the
/// buffer pool never touches `std::fs` directly, it only calls `read_block`
/// and `write_block` here. The file is grown lazily — `ensure_capacity`
/// extends it with zero-filled pages, relying on the same `set_len`
/// zero-fill guarantee any positional-I/O page store depends on.
pub struct PageFile {
    path: PathBuf,
    file: File,
    num_pages: u64,
}

impl PageFile {
    /// Creates a new page file at `path` containing one zero-filled page
    /// (spec §6: "create a new file containing one zero-filled page").
    ///
    /// # Errors
    ///
    /// Returns an error if a file already exists at `path` or cannot be
    /// created.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        let mut page_file = Self {
            path: path.to_path_buf(),
            file,
            num_pages: 0,
        };
        page_file.ensure_capacity(1)?;
        Ok(page_file)
    }

    /// Opens an existing page file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PageFileNotFound`] if `path` does not exist, or
    /// [`Error::Io`] if it exists but cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::PageFileNotFound(path.display().to_string()));
        }

        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        let num_pages = len / PAGE_SIZE as u64;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            num_pages,
        })
    }

    /// Returns the path backing this page file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of whole pages currently allocated in the file.
    #[must_use]
    pub fn num_pages(&self) -> u64 {
        self.num_pages
    }

    /// Reads the page at `page_number` into `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadFailed`] if the page lies beyond the file's
    /// current extent or the read otherwise fails.
    pub fn read_block(&mut self, page_number: PageNumber, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        if page_number.index() >= self.num_pages {
            return Err(Error::ReadFailed(page_number.index()));
        }

        self.file
            .seek(SeekFrom::Start(page_number.offset()))
            .map_err(|_| Error::ReadFailed(page_number.index()))?;
        self.file
            .read_exact(buf)
            .map_err(|_| Error::ReadFailed(page_number.index()))?;
        Ok(())
    }

    /// Writes `buf` to the page at `page_number`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailed`] if the write fails. Callers must
    /// `ensure_capacity` first; `write_block` does not grow the file.
    pub fn write_block(&mut self, page_number: PageNumber, buf: &[u8; PAGE_SIZE]) -> Result<()> {
        if page_number.index() >= self.num_pages {
            return Err(Error::WriteFailed(page_number.index()));
        }

        self.file
            .seek(SeekFrom::Start(page_number.offset()))
            .map_err(|_| Error::WriteFailed(page_number.index()))?;
        self.file
            .write_all(buf)
            .map_err(|_| Error::WriteFailed(page_number.index()))?;
        Ok(())
    }

    /// Ensures the file holds at least `min_pages` pages, growing it with
    /// zero-filled pages as needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the underlying extension fails.
    pub fn ensure_capacity(&mut self, min_pages: u64) -> Result<()> {
        if min_pages <= self.num_pages {
            return Ok(());
        }

        let new_len = min_pages * PAGE_SIZE as u64;
        self.file.set_len(new_len)?;
        self.num_pages = min_pages;
        Ok(())
    }

    /// Flushes any buffered writes to the underlying storage device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the sync fails.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all().map_err(Error::from)
    }
}

// `close` (spec §6) has no separate method: dropping a `PageFile` closes the
// descriptor, which is the idiomatic equivalent in Rust.
