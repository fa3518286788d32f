//! Behavioral contract shared by every storage adapter.
//!
//! Each scenario runs against both backends through the `StorageAdapter`
//! trait: the in-memory tree and the object store over the fake flat-key
//! client, both with small page sizes so bulk operations actually paginate.

use storage_core::{Error, StorageAdapter, StoragePath};
use storage_memory::MemoryStorage;
use storage_object::{FakeObjectClient, ObjectStorage};
use tokio_util::sync::CancellationToken;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn backends() -> Vec<(&'static str, Box<dyn StorageAdapter>)> {
    init_tracing();
    vec![
        ("memory", Box::new(MemoryStorage::with_page_size(2))),
        (
            "object",
            Box::new(ObjectStorage::new(FakeObjectClient::with_page_size(2))),
        ),
    ]
}

fn p(path: &str) -> StoragePath {
    StoragePath::parse(path).unwrap()
}

#[tokio::test]
async fn test_ancestors_exist_after_nested_file_write() {
    for (name, store) in backends() {
        let cancel = CancellationToken::new();
        store.write(&p("a/b/c.txt"), b"x", &cancel).await.unwrap();

        assert!(
            store.directory_exists(&p("a/"), &cancel).await.unwrap(),
            "backend {name}"
        );
        assert!(
            store.directory_exists(&p("a/b/"), &cancel).await.unwrap(),
            "backend {name}"
        );
        assert!(
            !store.directory_exists(&p("a/b/d/"), &cancel).await.unwrap(),
            "backend {name}"
        );
    }
}

#[tokio::test]
async fn test_root_always_exists() {
    for (name, store) in backends() {
        let cancel = CancellationToken::new();
        assert!(
            store
                .directory_exists(&StoragePath::root(), &cancel)
                .await
                .unwrap(),
            "backend {name}"
        );
    }
}

#[tokio::test]
async fn test_double_touch_fails() {
    for (name, store) in backends() {
        let cancel = CancellationToken::new();
        store.touch(&p("x.txt"), &cancel).await.unwrap();
        let err = store.touch(&p("x.txt"), &cancel).await.unwrap_err();
        assert!(
            matches!(err, Error::FileAlreadyExists { .. }),
            "backend {name}"
        );
    }
}

#[tokio::test]
async fn test_copy_and_move_contract() {
    for (name, store) in backends() {
        let cancel = CancellationToken::new();
        store.write(&p("src.txt"), b"payload", &cancel).await.unwrap();

        store.copy(&p("src.txt"), &p("copy.txt"), &cancel).await.unwrap();
        assert_eq!(
            store.read(&p("src.txt"), &cancel).await.unwrap(),
            b"payload",
            "backend {name}"
        );
        assert_eq!(
            store.read(&p("copy.txt"), &cancel).await.unwrap(),
            b"payload",
            "backend {name}"
        );

        store
            .move_file(&p("copy.txt"), &p("moved.txt"), &cancel)
            .await
            .unwrap();
        assert!(
            !store.file_exists(&p("copy.txt"), &cancel).await.unwrap(),
            "backend {name}"
        );
        assert_eq!(
            store.read(&p("moved.txt"), &cancel).await.unwrap(),
            b"payload",
            "backend {name}"
        );
    }
}

#[tokio::test]
async fn test_path_normalization_is_backend_agnostic() {
    for (name, store) in backends() {
        let cancel = CancellationToken::new();
        store.write(&p("/a//b/c.txt"), b"x", &cancel).await.unwrap();
        assert_eq!(
            store.read(&p("a/b/c.txt"), &cancel).await.unwrap(),
            b"x",
            "backend {name}"
        );
        assert_eq!(
            store.read(&p("a\\b\\c.txt"), &cancel).await.unwrap(),
            b"x",
            "backend {name}"
        );
    }
}

#[tokio::test]
async fn test_bulk_delete_spans_pages() {
    for (name, store) in backends() {
        let cancel = CancellationToken::new();
        // Page size is 2; seven files force four pages.
        for i in 0..7 {
            store
                .write(&p(&format!("bulk/f{i}.txt")), b"x", &cancel)
                .await
                .unwrap();
        }
        store.write(&p("keep.txt"), b"x", &cancel).await.unwrap();

        store.delete_directory(&p("bulk/"), &cancel).await.unwrap();

        assert!(
            !store.directory_exists(&p("bulk/"), &cancel).await.unwrap(),
            "backend {name}"
        );
        assert!(
            store.file_exists(&p("keep.txt"), &cancel).await.unwrap(),
            "backend {name}"
        );
    }
}

#[tokio::test]
async fn test_bulk_copy_then_move_directory() {
    for (name, store) in backends() {
        let cancel = CancellationToken::new();
        store.write(&p("src/a.txt"), b"a", &cancel).await.unwrap();
        store.write(&p("src/deep/b.txt"), b"b", &cancel).await.unwrap();
        store.write(&p("src/deep/c.txt"), b"c", &cancel).await.unwrap();

        store
            .copy_directory(&p("src/"), &p("copied/"), &cancel)
            .await
            .unwrap();
        assert_eq!(
            store.read(&p("copied/deep/b.txt"), &cancel).await.unwrap(),
            b"b",
            "backend {name}"
        );

        store
            .move_directory(&p("src/"), &p("moved/"), &cancel)
            .await
            .unwrap();
        assert!(
            !store.directory_exists(&p("src/"), &cancel).await.unwrap(),
            "backend {name}"
        );
        assert_eq!(
            store.read(&p("moved/deep/c.txt"), &cancel).await.unwrap(),
            b"c",
            "backend {name}"
        );
    }
}

#[tokio::test]
async fn test_list_reports_files_and_child_directories() {
    for (name, store) in backends() {
        let cancel = CancellationToken::new();
        store.write(&p("dir/a.txt"), b"1", &cancel).await.unwrap();
        store.write(&p("dir/sub/b.txt"), b"2", &cancel).await.unwrap();

        let entries = store.list(&p("dir/"), &cancel).await.unwrap();
        let listed: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(listed, vec!["dir/a.txt", "dir/sub/"], "backend {name}");
    }
}

#[tokio::test]
async fn test_listing_a_missing_directory_is_empty() {
    for (name, store) in backends() {
        let cancel = CancellationToken::new();
        store.write(&p("present/a.txt"), b"x", &cancel).await.unwrap();

        let entries = store.list(&p("ghost/"), &cancel).await.unwrap();
        assert!(entries.is_empty(), "backend {name}");
        let entries = store.list(&p("present/ghost/"), &cancel).await.unwrap();
        assert!(entries.is_empty(), "backend {name}");
    }
}

#[tokio::test]
async fn test_cancellation_is_a_distinct_signal() {
    for (name, store) in backends() {
        let cancel = CancellationToken::new();
        store.write(&p("f"), b"x", &cancel).await.unwrap();

        cancel.cancel();
        let err = store.read(&p("f"), &cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled), "backend {name}");
        let err = store
            .delete_directory(&p("anything/"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled), "backend {name}");
    }
}
