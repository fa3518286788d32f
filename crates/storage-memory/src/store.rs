//! `StorageAdapter` implementation over the in-memory tree

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use storage_core::{
    check_cancelled, ensure_file, for_each_page, DirEntry, EntryKind, Error, FileInfo,
    ObjectPage, PageFlow, PageSource, Result, StorageAdapter, StoragePath, DEFAULT_PAGE_SIZE,
};
use tokio_util::sync::CancellationToken;

use crate::tree::{DirectoryNode, FileNode};

/// In-memory storage backend.
///
/// The directory tree lives behind a single mutex; the lock is only held
/// for the duration of one synchronous tree operation, never across an
/// await point. Intended for a single logical owner: overlapping bulk
/// operations from independent callers interleave without isolation, the
/// same as on a remote object store.
pub struct MemoryStorage {
    root: Mutex<DirectoryNode>,
    page_size: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Use a custom page size for the synthetic listing pagination.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            root: Mutex::new(DirectoryNode::default()),
            page_size,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, DirectoryNode>> {
        self.root
            .lock()
            .map_err(|_| Error::backend("memory tree lock poisoned"))
    }

    /// Remove one file during a bulk delete. Missing entries are fine:
    /// the listing that produced the key may lag a concurrent change.
    fn remove_file_by_key(&self, key: &str) -> Result<()> {
        let path = StoragePath::parse(key)?;
        let mut guard = self.lock()?;
        if let Some(parent) = parent_node_mut(&mut guard, &path) {
            parent.files.remove(&path);
        }
        Ok(())
    }

    /// Copy one file during a bulk copy, rewriting the source prefix to
    /// the destination prefix. Overwrites silently, like plain writes.
    fn copy_file_by_key(&self, key: &str, src_prefix: &str, dst_prefix: &str) -> Result<()> {
        let source = StoragePath::parse(key)?;
        let suffix = key.strip_prefix(src_prefix).unwrap_or(key);
        let target = StoragePath::parse(format!("{dst_prefix}{suffix}"))?;

        let mut guard = self.lock()?;
        let data = match parent_node(&guard, &source).and_then(|p| p.files.get(&source)) {
            Some(file) => file.data.clone(),
            None => return Ok(()),
        };
        insert_file(&mut guard, &target, data)?;
        Ok(())
    }
}

/// The node containing `path`: the root for a single-segment path,
/// otherwise the second-to-last tree element. Pure lookup.
fn parent_node<'a>(root: &'a DirectoryNode, path: &StoragePath) -> Option<&'a DirectoryNode> {
    let tree = path.tree();
    if tree.len() < 2 {
        Some(root)
    } else {
        root.find(&tree[..tree.len() - 1])
    }
}

fn parent_node_mut<'a>(
    root: &'a mut DirectoryNode,
    path: &StoragePath,
) -> Option<&'a mut DirectoryNode> {
    let tree = path.tree();
    if tree.len() < 2 {
        Some(root)
    } else {
        root.find_mut(&tree[..tree.len() - 1])
    }
}

/// Materialize the containing directory and insert the file, rejecting a
/// path that already exists as a directory.
fn insert_file(root: &mut DirectoryNode, path: &StoragePath, data: Vec<u8>) -> Result<()> {
    let tree = path.tree();
    let parent = if tree.len() < 2 {
        root
    } else {
        root.get_or_create(&tree[..tree.len() - 1])?
    };
    if parent.directories.contains_key(&path.as_directory()) {
        return Err(Error::path_is_a_directory(path));
    }
    parent.files.insert(path.clone(), FileNode { data });
    Ok(())
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn file_exists(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<bool> {
        check_cancelled(cancel)?;
        ensure_file(path)?;
        let guard = self.lock()?;
        Ok(parent_node(&guard, path)
            .map(|parent| parent.files.contains_key(path))
            .unwrap_or(false))
    }

    async fn directory_exists(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        check_cancelled(cancel)?;
        if path.is_root() {
            return Ok(true);
        }
        let dir = path.as_directory();
        let guard = self.lock()?;
        Ok(guard.find(dir.tree()).is_some())
    }

    async fn get(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<Option<FileInfo>> {
        check_cancelled(cancel)?;
        ensure_file(path)?;
        let guard = self.lock()?;
        Ok(parent_node(&guard, path)
            .and_then(|parent| parent.files.get(path))
            .map(|file| FileInfo {
                path: path.clone(),
                size: file.data.len() as u64,
            }))
    }

    async fn read(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<Vec<u8>> {
        check_cancelled(cancel)?;
        ensure_file(path)?;
        let guard = self.lock()?;
        parent_node(&guard, path)
            .and_then(|parent| parent.files.get(path))
            .map(|file| file.data.clone())
            .ok_or_else(|| Error::file_not_found(path))
    }

    async fn write(
        &self,
        path: &StoragePath,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<()> {
        check_cancelled(cancel)?;
        ensure_file(path)?;
        let mut guard = self.lock()?;
        insert_file(&mut guard, path, data.to_vec())
    }

    async fn touch(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<()> {
        check_cancelled(cancel)?;
        ensure_file(path)?;
        let mut guard = self.lock()?;
        if parent_node(&guard, path)
            .map(|parent| parent.files.contains_key(path))
            .unwrap_or(false)
        {
            return Err(Error::file_already_exists(path));
        }
        insert_file(&mut guard, path, Vec::new())
    }

    async fn copy(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()> {
        check_cancelled(cancel)?;
        ensure_file(src)?;
        ensure_file(dst)?;
        let mut guard = self.lock()?;
        let data = parent_node(&guard, src)
            .and_then(|parent| parent.files.get(src))
            .map(|file| file.data.clone())
            .ok_or_else(|| Error::file_not_found(src))?;
        if parent_node(&guard, dst)
            .map(|parent| parent.files.contains_key(dst))
            .unwrap_or(false)
        {
            return Err(Error::file_already_exists(dst));
        }
        insert_file(&mut guard, dst, data)
    }

    async fn move_file(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.copy(src, dst, cancel).await?;
        check_cancelled(cancel)?;
        let mut guard = self.lock()?;
        if let Some(parent) = parent_node_mut(&mut guard, src) {
            parent.files.remove(src);
        }
        Ok(())
    }

    async fn delete(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<()> {
        check_cancelled(cancel)?;
        ensure_file(path)?;
        let mut guard = self.lock()?;
        parent_node_mut(&mut guard, path)
            .and_then(|parent| parent.files.remove(path))
            .map(|_| ())
            .ok_or_else(|| Error::file_not_found(path))
    }

    async fn list(&self, path: &StoragePath, cancel: &CancellationToken) -> Result<Vec<DirEntry>> {
        check_cancelled(cancel)?;
        let dir = path.as_directory();
        let guard = self.lock()?;
        let node = if dir.is_root() {
            Some(&*guard)
        } else {
            let tree = dir.tree();
            guard.at_level(&dir, tree.len() - 1).ok()
        };
        // A missing directory lists as empty, the same as the object
        // backend, which cannot tell absent prefixes from empty ones.
        let Some(node) = node else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<DirEntry> = node
            .directories
            .keys()
            .map(|key| DirEntry {
                path: key.clone(),
                kind: EntryKind::Directory,
            })
            .chain(node.files.keys().map(|key| DirEntry {
                path: key.clone(),
                kind: EntryKind::File,
            }))
            .collect();
        entries.sort_by(|a, b| a.path.as_str().cmp(b.path.as_str()));
        Ok(entries)
    }

    async fn delete_directory(
        &self,
        path: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let dir = path.as_directory();
        tracing::debug!(dir = %dir, "Deleting directory tree");
        for_each_page(self, &dir, cancel, move |page| async move {
            for key in &page.keys {
                check_cancelled(cancel)?;
                self.remove_file_by_key(key)?;
            }
            Ok(PageFlow::Continue)
        })
        .await?;

        // Detach the node itself; empty descendants go with it.
        let mut guard = self.lock()?;
        if dir.is_root() {
            guard.directories.clear();
            guard.files.clear();
        } else if let Some(parent) = parent_node_mut(&mut guard, &dir) {
            parent.directories.remove(&dir);
        }
        Ok(())
    }

    async fn copy_directory(
        &self,
        src: &StoragePath,
        dst: &StoragePath,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let src_dir = src.as_directory();
        let dst_dir = dst.as_directory();
        tracing::debug!(src = %src_dir, dst = %dst_dir, "Copying directory tree");

        // An existing but file-less source still yields the destination node.
        if !dst_dir.is_root() && self.directory_exists(&src_dir, cancel).await? {
            let mut guard = self.lock()?;
            guard.get_or_create(dst_dir.tree())?;
        }

        let src_prefix: &str = src_dir.as_str();
        let dst_prefix: &str = dst_dir.as_str();
        for_each_page(self, &src_dir, cancel, move |page| async move {
            for key in &page.keys {
                check_cancelled(cancel)?;
                self.copy_file_by_key(key, src_prefix, dst_prefix)?;
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
        _expires_at: Option<DateTime<Utc>>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        check_cancelled(cancel)?;
        ensure_file(path)?;
        if !self.file_exists(path, cancel).await? {
            return Err(Error::file_not_found(path));
        }
        Err(Error::backend(
            "the in-memory store does not serve public URLs",
        ))
    }
}

#[async_trait]
impl PageSource for MemoryStorage {
    async fn next_page(&self, prefix: &str, cursor: Option<&str>) -> Result<ObjectPage> {
        let guard = self.lock()?;
        let node = if prefix.is_empty() {
            Some(&*guard)
        } else {
            let dir = StoragePath::parse(prefix)?;
            guard.find(dir.tree())
        };

        let mut keys = Vec::new();
        if let Some(node) = node {
            node.collect_file_keys(&mut keys);
        }
        keys.sort();

        let start = match cursor {
            Some(c) => keys.partition_point(|key| key.as_str() <= c),
            None => 0,
        };
        let end = (start + self.page_size).min(keys.len());
        let page: Vec<String> = keys[start..end].to_vec();
        let truncated = end < keys.len();
        Ok(ObjectPage {
            cursor: page.last().cloned(),
            keys: page,
            truncated,
        })
    }
}
