use proptest::prelude::*;
use storage_core::StoragePath;

proptest! {
    #[test]
    fn test_normalization_invariants(s in "[a-zA-Z0-9./\\\\ _-]{1,64}") {
        let Ok(path) = StoragePath::parse(&s) else {
            // Whitespace-only inputs are rejected, nothing else to check.
            return Ok(());
        };
        let normalized = path.as_str();

        // No backslashes, no duplicate separators, no leading separator.
        prop_assert!(!normalized.contains('\\'));
        prop_assert!(!normalized.contains("//"));
        prop_assert!(!normalized.starts_with('/'));

        // Trailing separator present iff directory-flagged.
        if !path.is_root() {
            prop_assert_eq!(normalized.ends_with('/'), path.is_directory());
        }

        // Normalization is idempotent: re-parsing the normalized form is identity.
        if !normalized.trim().is_empty() {
            let reparsed = StoragePath::parse(normalized).unwrap();
            prop_assert_eq!(&reparsed, &path);
            prop_assert_eq!(reparsed.is_directory(), path.is_directory());
        }
    }

    #[test]
    fn test_leading_and_duplicate_separators_do_not_matter(
        segments in prop::collection::vec("[a-zA-Z0-9_-]{1,8}", 1..5),
        leading in any::<bool>(),
    ) {
        let plain = segments.join("/");
        let mut noisy = segments.join("//");
        if leading {
            noisy.insert(0, '/');
        }
        let a = StoragePath::parse(&plain).unwrap();
        let b = StoragePath::parse(&noisy).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn test_tree_prefixes_are_cumulative(
        segments in prop::collection::vec("[a-zA-Z0-9_-]{1,8}", 1..6),
    ) {
        let raw = format!("{}/", segments.join("/"));
        let path = StoragePath::parse(&raw).unwrap();
        let tree = path.tree();
        prop_assert_eq!(tree.len(), segments.len());
        for (depth, prefix) in tree.iter().enumerate() {
            prop_assert!(prefix.is_directory());
            let expected = format!("{}/", segments[..=depth].join("/"));
            prop_assert_eq!(prefix.as_str(), expected.as_str());
            // Each prefix is itself a prefix of the full path.
            prop_assert!(path.as_str().starts_with(prefix.as_str()));
        }
        // The final tree element is the path itself.
        prop_assert_eq!(tree.last().unwrap(), &path);
    }
}
