//! `StorageAdapter` implementation over an [`ObjectClient`]
//!
//! Existence preconditions are re-derived from the backend on every call:
//! the store is the source of truth and may be modified out-of-band, so
//! nothing here caches a previous answer.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use storage_core::{
    check_cancelled, ensure_file, for_each_page, DirEntry, EntryKind, Error, FileInfo,
    ObjectPage, PageFlow, PageSource, Pages, Result, StorageAdapter, StoragePath,
};
use tokio_util::sync::CancellationToken;

use crate::client::{ObjectClient, ObjectInfo};

/// Object-store backend: hierarchical operations over flat keys.
pub struct ObjectStorage<C> {
    client: C,
}

impl<C> ObjectStorage<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: ObjectClient> ObjectStorage<C> {
    async fn head(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<Option<ObjectInfo>> {
        check_cancelled(cancel)?;
        self.client.head(path.as_str()).await.map_err(Error::from)
    }

    async fn require_present(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<ObjectInfo> {
        self.head(path, cancel)
            .await?
            .ok_or_else(|| Error::file_not_found(path))
    }

    async fn require_absent(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<()> {
        match self.head(path, cancel).await? {
            Some(_) => Err(Error::file_already_exists(path)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<C: ObjectClient> StorageAdapter for ObjectStorage<C> {
    async fn file_exists(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<bool> {
        ensure_file(path)?;
        Ok(self.head(path, cancel).await?.is_some())
    }

    async fn directory_exists(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        if path.is_root() {
            return Ok(true);
        }
        // A directory "exists" when anything lives under its prefix.
        let dir = path.as_directory();
        let mut pages = Pages::new(self, &dir, cancel);
        Ok(pages.try_next().await?.is_some())
    }

    async fn get(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<Option<FileInfo>> {
        ensure_file(path)?;
        Ok(self.head(path, cancel).await?.map(|info| FileInfo {
            path: path.clone(),
            size: info.size,
        }))
    }

    async fn read(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<Vec<u8>> {
        ensure_file(path)?;
        check_cancelled(cancel)?;
        self.client
            .get(path.as_str())
            .await
            .map_err(Error::from)?
            .ok_or_else(|| Error::file_not_found(path))
    }

    async fn write(
        &self,
        path: &StoragePath,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<()> {
        ensure_file(path)?;
        check_cancelled(cancel)?;
        self.client
            .put(path.as_str(), data.to_vec())
            .await
            .map_err(Error::from)
    }

    async fn touch(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<()> {
        ensure_file(path)?;
        self.require_absent(path, cancel).await?;
        check_cancelled(cancel)?;
        self.client
            .put(path.as_str(), Vec::new())
            .await
            .map_err(Error::from)
    }

    async fn copy(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()> {
        ensure_file(src)?;
        ensure_file(dst)?;
        self.require_present(src, cancel).await?;
        self.require_absent(dst, cancel).await?;
        check_cancelled(cancel)?;
        self.client
            .copy(src.as_str(), dst.as_str())
            .await
            .map_err(Error::from)
    }

    async fn move_file(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()> {
        // Copy-then-delete. A delete failure here leaves both keys
        // present and propagates; there is no rollback of the copy.
        self.copy(src, dst, cancel).await?;
        check_cancelled(cancel)?;
        self.client.delete(src.as_str()).await.map_err(|err| {
            tracing::warn!(src = %src, dst = %dst, "Move copied but failed to delete source");
            Error::from(err)
        })
    }

    async fn delete(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<()> {
        ensure_file(path)?;
        self.require_present(path, cancel).await?;
        check_cancelled(cancel)?;
        self.client
            .delete(path.as_str())
            .await
            .map_err(Error::from)
    }

    async fn list(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<Vec<DirEntry>> {
        let dir = path.as_directory();
        let prefix = dir.as_str().to_string();
        let mut file_keys = BTreeSet::new();
        let mut dir_keys = BTreeSet::new();

        let mut pages = Pages::new(self, &dir, cancel);
        while let Some(page) = pages.try_next().await? {
            for key in &page.keys {
                let Some(remainder) = key.strip_prefix(prefix.as_str()) else {
                    continue;
                };
                match remainder.split_once('/') {
                    Some((child, _)) => {
                        dir_keys.insert(format!("{prefix}{child}/"));
                    }
                    None => {
                        file_keys.insert(key.clone());
                    }
                }
            }
        }

        let mut entries = Vec::with_capacity(file_keys.len() + dir_keys.len());
        for key in dir_keys {
            entries.push(DirEntry {
                path: StoragePath::parse(key)?,
                kind: EntryKind::Directory,
            });
        }
        for key in file_keys {
            entries.push(DirEntry {
                path: StoragePath::parse(key)?,
                kind: EntryKind::File,
            });
        }
        entries.sort_by(|a, b| a.path.as_str().cmp(b.path.as_str()));
        Ok(entries)
    }

    async fn delete_directory(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let dir = path.as_directory();
        tracing::debug!(dir = %dir, "Deleting object prefix");
        let client = &self.client;
        for_each_page(self, &dir, cancel, move |page| async move {
            for key in &page.keys {
                check_cancelled(cancel)?;
                client.delete(key).await.map_err(Error::from)?;
            }
            Ok(PageFlow::Continue)
        })
        .await
    }

    async fn copy_directory(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let src_dir = src.as_directory();
        let dst_dir = dst.as_directory();
        tracing::debug!(src = %src_dir, dst = %dst_dir, "Copying object prefix");
        let client = &self.client;
        let src_prefix: &str = src_dir.as_str();
        let dst_prefix: &str = dst_dir.as_str();
        for_each_page(self, &src_dir, cancel, move |page| async move {
            for key in &page.keys {
                check_cancelled(cancel)?;
                let suffix = key.strip_prefix(src_prefix).unwrap_or(key);
                let target = format!("{dst_prefix}{suffix}");
                client.copy(key, &target).await.map_err(Error::from)?;
            }
            Ok(PageFlow::Continue)
        })
        .await
    }

    async fn move_directory(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.copy_directory(src, dst, cancel).await?;
        self.delete_directory(src, cancel).await
    }

    async fn public_url(
        &self,
        path: &StoragePath,
        expires_at: Option<DateTime<Utc>>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        ensure_file(path)?;
        self.require_present(path, cancel).await?;
        let expires_at = expires_at.unwrap_or_else(|| Utc::now() + Duration::days(1));
        check_cancelled(cancel)?;
        self.client
            .presigned_url(path.as_str(), expires_at)
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl<C: ObjectClient> PageSource for ObjectStorage<C> {
    async fn next_page(&self, prefix: &str, cursor: Option<&str>) -> Result<ObjectPage> {
        self.client.list(prefix, cursor).await.map_err(Error::from)
    }
}
