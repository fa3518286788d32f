//! In-memory object client for tests
//!
//! Keys live in a `BTreeMap`, so listing order is lexicographic like a
//! real object store. The page size is configurable to exercise the
//! pagination protocol with small fixtures, and a delete failure can be
//! injected to reproduce the move inconsistency window.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use storage_core::{ObjectPage, DEFAULT_PAGE_SIZE};

use crate::client::{ClientError, ObjectClient, ObjectInfo};

/// Fake flat-key backend.
pub struct FakeObjectClient {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    page_size: usize,
    fail_delete_of: Mutex<Option<String>>,
    list_calls: AtomicUsize,
}

impl Default for FakeObjectClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeObjectClient {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            page_size,
            fail_delete_of: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Seed an object without going through the adapter.
    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    /// Snapshot of all stored keys, in listing order.
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    /// Make the next delete of `key` fail with a client error.
    /// The injection clears after it fires once.
    pub fn fail_next_delete_of(&self, key: &str) {
        *self.fail_delete_of.lock().unwrap() = Some(key.to_string());
    }

    /// Number of `list` calls issued so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectClient for FakeObjectClient {
    async fn head(&self, key: &str) -> Result<Option<ObjectInfo>, ClientError> {
        Ok(self.objects.lock().unwrap().get(key).map(|data| ObjectInfo {
            key: key.to_string(),
            size: data.len() as u64,
        }))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ClientError> {
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), ClientError> {
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<(), ClientError> {
        let mut objects = self.objects.lock().unwrap();
        let data = objects
            .get(src_key)
            .cloned()
            .ok_or_else(|| ClientError::new(format!("no such key: {src_key}")))?;
        objects.insert(dst_key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ClientError> {
        let mut injected = self.fail_delete_of.lock().unwrap();
        if injected.as_deref() == Some(key) {
            *injected = None;
            return Err(ClientError::new(format!("injected delete failure: {key}")));
        }
        drop(injected);
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str, cursor: Option<&str>) -> Result<ObjectPage, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.lock().unwrap();
        let matching: Vec<&String> = objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .collect();
        let start = match cursor {
            Some(c) => matching.partition_point(|key| key.as_str() <= c),
            None => 0,
        };
        let keys: Vec<String> = matching[start..]
            .iter()
            .take(self.page_size)
            .map(|key| (*key).clone())
            .collect();
        let truncated = start + keys.len() < matching.len();
        Ok(ObjectPage {
            cursor: keys.last().cloned(),
            keys,
            truncated,
        })
    }

    async fn presigned_url(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, ClientError> {
        if !self.objects.lock().unwrap().contains_key(key) {
            return Err(ClientError::new(format!("no such key: {key}")));
        }
        Ok(format!(
            "https://objects.example/{key}?expires={}",
            expires_at.timestamp()
        ))
    }
}
