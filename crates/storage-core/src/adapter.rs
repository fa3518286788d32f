//! The adapter contract implemented by every storage backend
//!
//! All operations are asynchronous and carry a cooperative cancellation
//! token. Backends check the token before every backend call; a fired
//! token surfaces as [`Error::Cancelled`], never as a generic failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::path::StoragePath;

/// Byte source returned by streaming reads.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Descriptor for a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: StoragePath,
    /// Content length in bytes
    pub size: u64,
}

/// Kind of a directory listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Full path of the entry (directory entries carry the trailing separator)
    pub path: StoragePath,
    pub kind: EntryKind,
}

/// Fail with [`Error::Cancelled`] if the operation's token has fired.
pub fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

/// Reject directory-flagged paths handed to file-only operations.
pub fn ensure_file(path: &StoragePath) -> Result<()> {
    if path.is_directory() {
        Err(Error::path_is_a_directory(path))
    } else {
        Ok(())
    }
}

/// Path-addressed storage operations, backend-agnostic.
///
/// Existence preconditions are re-derived from the backend on every call;
/// the backend is the source of truth and may be modified out-of-band.
/// Bulk directory operations are best-effort and non-atomic: `move_file`
/// and `move_directory` are copy-then-delete with no rollback, so a delete
/// failure after a successful copy leaves both paths populated and
/// propagates the delete error.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// True iff a file exists at `path`.
    async fn file_exists(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<bool>;

    /// True iff the directory exists. The root always exists.
    async fn directory_exists(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<bool>;

    /// Fetch the descriptor for `path`, or `None` when absent.
    ///
    /// Absence is a result, not an error, so callers can distinguish
    /// "doesn't exist" from "exists but retrieval failed".
    async fn get(&self, path: &StoragePath, cancel: &CancellationToken)
        -> Result<Option<FileInfo>>;

    /// Read the full content. Fails with [`Error::FileNotFound`] when absent.
    async fn read(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<Vec<u8>>;

    /// Read the full content as UTF-8 text.
    async fn read_to_string(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let bytes = self.read(path, cancel).await?;
        String::from_utf8(bytes).map_err(Error::backend)
    }

    /// Read the content as a byte stream.
    async fn read_stream(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<ByteStream> {
        let bytes = self.read(path, cancel).await?;
        Ok(Box::new(std::io::Cursor::new(bytes)))
    }

    /// Write `data` to `path`, silently replacing any existing content.
    async fn write(
        &self,
        path: &StoragePath,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Write UTF-8 text to `path`, silently replacing any existing content.
    async fn write_text(
        &self,
        path: &StoragePath,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.write(path, text.as_bytes(), cancel).await
    }

    /// Drain `reader` and write the collected bytes to `path`.
    async fn write_stream(
        &self,
        path: &StoragePath,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        cancel: &CancellationToken,
    ) -> Result<()> {
        check_cancelled(cancel)?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await.map_err(Error::backend)?;
        self.write(path, &data, cancel).await
    }

    /// Create a zero-length file. Fails with [`Error::FileAlreadyExists`]
    /// when `path` is already present.
    async fn touch(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<()>;

    /// Copy `src` to `dst`. Fails with [`Error::FileNotFound`] when `src`
    /// is absent and [`Error::FileAlreadyExists`] when `dst` is present.
    async fn copy(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Move `src` to `dst` with the same preconditions as [`copy`].
    ///
    /// Performed as copy-then-delete-source; not atomic.
    ///
    /// [`copy`]: StorageAdapter::copy
    async fn move_file(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Delete the file at `path`. Fails with [`Error::FileNotFound`] when absent.
    async fn delete(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<()>;

    /// List the first-level entries of a directory.
    async fn list(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<Vec<DirEntry>>;

    /// Delete everything under `path`, page by page.
    async fn delete_directory(&self, path: &StoragePath, cancel: &CancellationToken)
        -> Result<()>;

    /// Copy everything under `src` beneath `dst`, page by page.
    async fn copy_directory(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Copy everything under `src` beneath `dst`, then delete the source
    /// tree. Not atomic; see the trait-level note.
    async fn move_directory(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Produce a signed public URL for `path`.
    ///
    /// `expires_at` defaults to 24 hours from the time of the call. Fails
    /// with [`Error::FileNotFound`] when the file is absent. The returned
    /// URL is backend-specific and not validated here.
    async fn public_url(
        &self,
        path: &StoragePath,
        expires_at: Option<DateTime<Utc>>,
        cancel: &CancellationToken,
    ) -> Result<String>;
}
