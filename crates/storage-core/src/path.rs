//! Normalized path handling shared by every storage backend
//!
//! Callers address storage with arbitrary path strings (Windows or Unix
//! separators, duplicate or leading slashes). `StoragePath` reduces them to
//! a single canonical form: forward slashes, no leading slash, and a
//! trailing slash present exactly when the caller declared the path a
//! directory. Backends use the normalized form directly as their lookup or
//! object key.

use std::fmt;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Canonical path separator used in normalized form.
pub const SEPARATOR: char = '/';

/// A storage path normalized to a canonical, separator-agnostic form.
///
/// Directory-ness is declared by the caller through a trailing separator on
/// the raw input; it is never inferred from file extensions. The normalized
/// form of a directory always ends with `/`, the normalized form of a file
/// never does, and the root is the empty string.
///
/// Equality and hashing consider only the normalized form, so two inputs
/// that differ by duplicate or leading separators compare equal. Case is
/// significant.
#[derive(Debug)]
pub struct StoragePath {
    /// Raw input as the caller supplied it
    raw: String,
    /// Canonical form: forward slashes, collapsed, no leading slash
    normalized: String,
    /// True iff the raw input ended with a separator
    is_directory: bool,
    /// Memoized ancestor chain, built on first use
    tree: OnceLock<Vec<StoragePath>>,
}

impl StoragePath {
    /// Parse and normalize a raw path string.
    ///
    /// Fails with [`Error::InvalidPath`] for empty or whitespace-only
    /// input. A bare separator (`"/"` or `"\"`) normalizes to the root.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(Error::invalid_path(raw));
        }
        Ok(Self::normalize(raw))
    }

    /// The root sentinel: empty normalized form, directory-flagged.
    ///
    /// Every store treats the root as always existing.
    pub fn root() -> Self {
        Self {
            raw: String::new(),
            normalized: String::new(),
            is_directory: true,
            tree: OnceLock::new(),
        }
    }

    fn normalize(raw: String) -> Self {
        let unified = raw.replace('\\', "/");
        let is_directory = unified.ends_with(SEPARATOR);

        // Collapse separator runs and drop the leading separator in one pass.
        let mut normalized = String::with_capacity(unified.len());
        let mut previous_was_separator = true;
        for ch in unified.chars() {
            if ch == SEPARATOR {
                if !previous_was_separator {
                    normalized.push(SEPARATOR);
                }
                previous_was_separator = true;
            } else {
                normalized.push(ch);
                previous_was_separator = false;
            }
        }

        if normalized.is_empty() {
            // Input was separators only: the root.
            return Self {
                raw,
                normalized,
                is_directory: true,
                tree: OnceLock::new(),
            };
        }

        Self {
            raw,
            normalized,
            is_directory,
            tree: OnceLock::new(),
        }
    }

    fn from_normalized(normalized: String, is_directory: bool) -> Self {
        Self {
            raw: normalized.clone(),
            normalized,
            is_directory,
            tree: OnceLock::new(),
        }
    }

    /// The raw input this path was parsed from.
    pub fn original(&self) -> &str {
        &self.raw
    }

    /// The canonical form, which doubles as the backend key
    /// (object-store keys carry no leading slash).
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// True iff the caller declared this path a directory.
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// True for the root sentinel.
    pub fn is_root(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Final path segment, without any trailing separator.
    ///
    /// `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        let trimmed = self.normalized.trim_end_matches(SEPARATOR);
        trimmed.rsplit(SEPARATOR).next()
    }

    /// The ancestor chain ("path tree"): every cumulative prefix of this
    /// path, each a directory except possibly the final element, which
    /// keeps this path's own directory flag.
    ///
    /// For `a/b/c/` the tree is `a/`, `a/b/`, `a/b/c/`; for `a/b/c.txt` it
    /// is `a/`, `a/b/`, `a/b/c.txt`. The root's tree is empty. Computed
    /// once and memoized.
    pub fn tree(&self) -> &[StoragePath] {
        self.tree.get_or_init(|| {
            let segments: Vec<&str> = self
                .normalized
                .split(SEPARATOR)
                .filter(|segment| !segment.is_empty())
                .collect();
            let mut prefixes = Vec::with_capacity(segments.len());
            let mut cumulative = String::new();
            for (index, segment) in segments.iter().enumerate() {
                cumulative.push_str(segment);
                let is_last = index + 1 == segments.len();
                let as_directory = !is_last || self.is_directory;
                if as_directory {
                    cumulative.push(SEPARATOR);
                }
                prefixes.push(StoragePath::from_normalized(
                    cumulative.clone(),
                    as_directory,
                ));
            }
            prefixes
        })
    }

    /// The containing directory: the root when the tree has at most one
    /// element, otherwise the second-to-last tree element.
    pub fn parent(&self) -> StoragePath {
        let tree = self.tree();
        if tree.len() < 2 {
            StoragePath::root()
        } else {
            tree[tree.len() - 2].clone()
        }
    }

    /// This path in directory form (trailing separator), suitable as a
    /// listing prefix. File-flagged paths are not valid listing prefixes.
    pub fn as_directory(&self) -> StoragePath {
        if self.is_directory {
            return self.clone();
        }
        let mut normalized = self.normalized.clone();
        normalized.push(SEPARATOR);
        StoragePath::from_normalized(normalized, true)
    }

    /// This path in file form (no trailing separator). The root has no
    /// file form and is returned unchanged.
    pub fn as_file(&self) -> StoragePath {
        if !self.is_directory || self.is_root() {
            return self.clone();
        }
        let normalized = self.normalized.trim_end_matches(SEPARATOR).to_string();
        StoragePath::from_normalized(normalized, false)
    }
}

impl Clone for StoragePath {
    fn clone(&self) -> Self {
        // The memoized tree is rebuilt on demand in the clone.
        Self {
            raw: self.raw.clone(),
            normalized: self.normalized.clone(),
            is_directory: self.is_directory,
            tree: OnceLock::new(),
        }
    }
}

impl PartialEq for StoragePath {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for StoragePath {}

impl std::hash::Hash for StoragePath {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_is_memoized() {
        let path = StoragePath::parse("a/b/c/").unwrap();
        let first = path.tree().as_ptr();
        let second = path.tree().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_directory_flag_from_trailing_separator_only() {
        assert!(StoragePath::parse("a/b/").unwrap().is_directory());
        assert!(StoragePath::parse("a\\b\\").unwrap().is_directory());
        // No extension does not imply a directory.
        assert!(!StoragePath::parse("a/b").unwrap().is_directory());
        assert!(!StoragePath::parse("a/b.txt").unwrap().is_directory());
    }

    #[test]
    fn test_file_and_directory_twins() {
        let file = StoragePath::parse("a/b").unwrap();
        let dir = file.as_directory();
        assert_eq!(dir.as_str(), "a/b/");
        assert!(dir.is_directory());
        assert_eq!(dir.as_file(), file);
    }
}
