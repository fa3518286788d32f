//! The mutable directory tree behind [`MemoryStorage`](crate::MemoryStorage)
//!
//! Each node owns its children exclusively; the root node is owned by the
//! store and is mutated in place, never replaced. Child maps are keyed by
//! the full normalized tree-element path, so walking a path tree is a
//! sequence of direct map lookups.

use std::collections::HashMap;

use storage_core::{Error, Result, StoragePath};

/// A directory node: child directories and child files, keyed independently.
///
/// A file and a directory never share a normalized stem within one parent;
/// the mutating operations reject the colliding kind before inserting.
#[derive(Debug, Default)]
pub(crate) struct DirectoryNode {
    pub(crate) directories: HashMap<StoragePath, DirectoryNode>,
    pub(crate) files: HashMap<StoragePath, FileNode>,
}

/// A stored file's content.
#[derive(Debug, Clone, Default)]
pub(crate) struct FileNode {
    pub(crate) data: Vec<u8>,
}

impl DirectoryNode {
    /// Pure lookup along a chain of directory-flagged tree elements.
    ///
    /// Returns `None` at the first missing segment; never mutates.
    pub(crate) fn find(&self, tree: &[StoragePath]) -> Option<&DirectoryNode> {
        let mut current = self;
        for element in tree {
            current = current.directories.get(element)?;
        }
        Some(current)
    }

    pub(crate) fn find_mut(&mut self, tree: &[StoragePath]) -> Option<&mut DirectoryNode> {
        let mut current = self;
        for element in tree {
            current = current.directories.get_mut(element)?;
        }
        Some(current)
    }

    /// Walk the chain, creating any missing directory node along the way.
    ///
    /// Idempotent: a second call with the same chain finds the existing
    /// nodes and creates nothing. Fails with [`Error::FileAlreadyExists`]
    /// when a segment is already present as a file in its parent.
    pub(crate) fn get_or_create(&mut self, tree: &[StoragePath]) -> Result<&mut DirectoryNode> {
        let mut current = self;
        for element in tree {
            if current.files.contains_key(&element.as_file()) {
                return Err(Error::file_already_exists(element));
            }
            current = current.directories.entry(element.clone()).or_default();
        }
        Ok(current)
    }

    /// The directory node `level + 1` segments down `path`'s tree.
    ///
    /// Fails with [`Error::PathTreeLevelOutOfRange`] when the tree is too
    /// short or a segment has not been materialized.
    pub(crate) fn at_level(&self, path: &StoragePath, level: usize) -> Result<&DirectoryNode> {
        let out_of_range = || Error::PathTreeLevelOutOfRange {
            path: path.as_str().to_string(),
            level,
        };
        let tree = path.tree();
        if level >= tree.len() {
            return Err(out_of_range());
        }
        let mut current = self;
        for element in &tree[..=level] {
            current = current
                .directories
                .get(&element.as_directory())
                .ok_or_else(out_of_range)?;
        }
        Ok(current)
    }

    /// Collect every descendant file key, depth-first.
    pub(crate) fn collect_file_keys(&self, out: &mut Vec<String>) {
        for key in self.files.keys() {
            out.push(key.as_str().to_string());
        }
        for child in self.directories.values() {
            child.collect_file_keys(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(path: &str) -> StoragePath {
        StoragePath::parse(path).unwrap()
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut root = DirectoryNode::default();
        let path = dir("a/b/");

        let first = root.get_or_create(path.tree()).unwrap() as *const DirectoryNode;
        let second = root.get_or_create(path.tree()).unwrap() as *const DirectoryNode;
        assert_eq!(first, second);

        // No duplicate child entries at any level.
        assert_eq!(root.directories.len(), 1);
        let a = root.directories.get(&dir("a/")).unwrap();
        assert_eq!(a.directories.len(), 1);
    }

    #[test]
    fn test_get_or_create_rejects_file_collision() {
        let mut root = DirectoryNode::default();
        root.files
            .insert(dir("a").as_file(), FileNode { data: vec![1] });

        let err = root.get_or_create(dir("a/").tree()).unwrap_err();
        assert!(matches!(err, Error::FileAlreadyExists { .. }));
    }

    #[test]
    fn test_find_does_not_create() {
        let mut root = DirectoryNode::default();
        assert!(root.find(dir("a/b/").tree()).is_none());
        assert!(root.directories.is_empty());

        root.get_or_create(dir("a/b/").tree()).unwrap();
        assert!(root.find(dir("a/b/").tree()).is_some());
        assert!(root.find(dir("a/c/").tree()).is_none());
    }

    #[test]
    fn test_at_level_walks_intermediate_nodes() {
        let mut root = DirectoryNode::default();
        root.get_or_create(dir("a/b/c/").tree()).unwrap();

        let path = dir("a/b/c/");
        let level0 = root.at_level(&path, 0).unwrap();
        assert!(level0.directories.contains_key(&dir("a/b/")));

        let level2 = root.at_level(&path, 2).unwrap();
        assert!(level2.directories.is_empty());
    }

    #[test]
    fn test_at_level_out_of_range() {
        let mut root = DirectoryNode::default();
        root.get_or_create(dir("a/").tree()).unwrap();

        let path = dir("a/");
        assert!(matches!(
            root.at_level(&path, 1),
            Err(Error::PathTreeLevelOutOfRange { .. })
        ));
        assert!(matches!(
            root.at_level(&dir("a/missing/"), 1),
            Err(Error::PathTreeLevelOutOfRange { .. })
        ));
    }

    #[test]
    fn test_collect_file_keys_is_recursive() {
        let mut root = DirectoryNode::default();
        let nested = root.get_or_create(dir("a/b/").tree()).unwrap();
        nested
            .files
            .insert(dir("a/b/deep.txt").as_file(), FileNode::default());
        root.files
            .insert(dir("top.txt").as_file(), FileNode::default());

        let mut keys = Vec::new();
        root.collect_file_keys(&mut keys);
        keys.sort();
        assert_eq!(keys, vec!["a/b/deep.txt", "top.txt"]);
    }
}
