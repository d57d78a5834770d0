//! Page-level storage primitives.
//!
//! This module defines the core page abstractions:
//! - [`PageNumber`]: unique index of a page within the page file
//! - [`PageFile`]: the fixed-page-size file I/O collaborator

mod page_file;
mod page_number;

pub use page_file::PageFile;
pub use page_number::PageNumber;

/// Page size in bytes (4KB).
pub const PAGE_SIZE: usize = 4096;

/// Sentinel documented by the specification's vocabulary for "no page".
/// This crate represents the sentinel idiomatically as `Option<PageNumber>`
/// on frame descriptors; this constant exists only as a translation aid for
/// readers coming from that vocabulary and is not used internally.
pub const NO_PAGE: Option<PageNumber> = None;
