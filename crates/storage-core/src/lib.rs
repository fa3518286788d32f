//! Core abstractions for Storage Manager
//!
//! Provides normalized path handling, the adapter contract shared by all
//! storage backends, and the paginated enumeration protocol that backs
//! bulk directory operations.

pub mod adapter;
pub mod error;
pub mod pagination;
pub mod path;

pub use adapter::{
    check_cancelled, ensure_file, ByteStream, DirEntry, EntryKind, FileInfo, StorageAdapter,
};
pub use error::{Error, Result};
pub use pagination::{for_each_page, ObjectPage, PageFlow, PageSource, Pages, DEFAULT_PAGE_SIZE};
pub use path::StoragePath;
