//! Error types shared across the storage crates

use crate::path::StoragePath;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in storage operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Path was empty or otherwise unusable before normalization
    #[error("Invalid path: {raw:?}")]
    InvalidPath { raw: String },

    /// A file-only operation received a directory-flagged path
    #[error("Path is a directory: {path}")]
    PathIsADirectory { path: String },

    /// Operation requires the path to exist, but the backend reports it absent
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Operation requires the path to be absent, but the backend reports it present
    #[error("File already exists: {path}")]
    FileAlreadyExists { path: String },

    /// Dispatch to a backend name with no registered adapter
    #[error("No adapter registered under {name:?}")]
    AdapterNotFound { name: String },

    /// Path tree walk requested a level deeper than the materialized tree
    #[error("Path tree level {level} out of range for {path}")]
    PathTreeLevelOutOfRange { path: String, level: usize },

    /// The operation's cancellation signal fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Unclassified backend failure, passed through unchanged
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn invalid_path(raw: impl Into<String>) -> Self {
        Self::InvalidPath { raw: raw.into() }
    }

    pub fn path_is_a_directory(path: &StoragePath) -> Self {
        Self::PathIsADirectory {
            path: path.as_str().to_string(),
        }
    }

    pub fn file_not_found(path: &StoragePath) -> Self {
        Self::FileNotFound {
            path: path.as_str().to_string(),
        }
    }

    pub fn file_already_exists(path: &StoragePath) -> Self {
        Self::FileAlreadyExists {
            path: path.as_str().to_string(),
        }
    }

    pub fn backend<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Backend(source.into())
    }
}
