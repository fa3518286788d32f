//! Flat-key object client abstraction
//!
//! The client knows nothing about directories: keys are opaque strings,
//! listing is by prefix with a host-imposed page cap and a continuation
//! cursor. "Not found" is a first-class `None` outcome on `head` and
//! `get`, never an error to be caught and inspected; every other failure
//! is a [`ClientError`] that the adapter passes through unclassified.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use storage_core::{Error, ObjectPage};

/// Transport or service failure reported by an object client.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ClientError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        Error::Backend(Box::new(err))
    }
}

/// Metadata for a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
}

/// The backend calls the adapter is built on.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Metadata for `key`, or `None` when the object does not exist.
    async fn head(&self, key: &str) -> Result<Option<ObjectInfo>, ClientError>;

    /// Full content of `key`, or `None` when the object does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ClientError>;

    /// Store `data` under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), ClientError>;

    /// Server-side copy from `src_key` to `dst_key`.
    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<(), ClientError>;

    /// Delete the object under `key`.
    async fn delete(&self, key: &str) -> Result<(), ClientError>;

    /// One page of keys under `prefix`, following `cursor` when given.
    async fn list(&self, prefix: &str, cursor: Option<&str>) -> Result<ObjectPage, ClientError>;

    /// A signed URL for `key`, valid until `expires_at`.
    async fn presigned_url(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, ClientError>;
}
