use cardly_storage::{Storage, StorageError};
use tempfile::TempDir;

async fn storage(temp: &TempDir) -> Storage {
    Storage::builder().root(temp.path().join("data")).connect().await.unwrap()
}

#[tokio::test]
async fn path_traversal_is_blocked() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    assert!(storage.resolve("../etc/passwd").is_err());
    assert!(storage.resolve("foo/../../bar").is_err());
    assert!(storage.resolve("/etc/passwd").is_err());
}

#[tokio::test]
async fn write_then_read_returns_the_same_bytes() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    storage.write("foo/report.pdf", b"%PDF-1.7").await.unwrap();
    assert!(storage.exists("foo/report.pdf").unwrap());
    assert_eq!(storage.read("foo/report.pdf").await.unwrap(), b"%PDF-1.7");
}

#[tokio::test]
async fn overwrite_replaces_contents() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    storage.write("card.json", b"v1").await.unwrap();
    storage.write("card.json", b"v2").await.unwrap();
    assert_eq!(storage.read("card.json").await.unwrap(), b"v2");
}

#[tokio::test]
async fn namespaces_are_isolated_and_sharded() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    let alice = storage.namespace("Alice_01").unwrap();
    let bob = storage.namespace("bob-02").unwrap();

    alice.write("photo.png", b"a").await.unwrap();
    bob.write("photo.png", b"b").await.unwrap();

    let alice_path = alice.resolve("photo.png").unwrap();
    assert!(alice_path.ends_with("Alice_01/ph/ot/photo.png"), "{}", alice_path.display());
    assert_ne!(alice_path, bob.resolve("photo.png").unwrap());

    assert_eq!(alice.read("photo.png").await.unwrap(), b"a");
    assert_eq!(bob.read("photo.png").await.unwrap(), b"b");
}

#[tokio::test]
async fn invalid_namespaces_are_rejected() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    for name in ["", "../up", "a/b", "with space"] {
        let err = storage.namespace(name).unwrap_err();
        assert!(matches!(err, StorageError::InvalidNamespace { .. }), "{name}");
    }
}

#[tokio::test]
async fn delete_removes_the_file() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;
    let files = storage.namespace("owner").unwrap();

    files.write("file.txt", b"x").await.unwrap();
    files.delete("file.txt").await.unwrap();
    assert!(!files.exists("file.txt").unwrap());

    let err = files.delete("file.txt").await.unwrap_err();
    assert!(matches!(err, StorageError::FileNotFound { .. }));
}

#[tokio::test]
async fn reading_a_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let storage = storage(&temp).await;

    let err = storage.read("missing.bin").await.unwrap_err();
    assert!(matches!(err, StorageError::FileNotFound { .. }));
}

#[tokio::test]
async fn stale_temp_files_are_purged_on_connect() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("data");
    let shard = root.join("owner/ab/cd");
    std::fs::create_dir_all(&shard).unwrap();

    let leftover = shard.join("abcd.png.cardlytmp.7");
    std::fs::write(&leftover, b"partial").unwrap();
    let old = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
    std::fs::File::options().write(true).open(&leftover).unwrap().set_modified(old).unwrap();

    let _storage = Storage::builder().root(&root).connect().await.unwrap();

    assert!(!leftover.exists());
    assert!(!root.join("owner").exists(), "empty shard directories should be pruned");
}

#[tokio::test]
async fn missing_root_fails_without_create() {
    let temp = TempDir::new().unwrap();
    let err = Storage::builder().root(temp.path().join("absent")).create(false).connect().await;
    assert!(matches!(err, Err(StorageError::Io { .. })));
}
