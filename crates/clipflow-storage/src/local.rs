//! Local disk storage backend.

use crate::{StorageError, StorageGateway, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Storage backend rooted at a directory on the local filesystem.
///
/// This is the "local" tier: ffmpeg reads and writes files in place and
/// publishing is a no-op. `remote_url` returns the filesystem path rendered
/// as a string so that resolved sources are usable either way.
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    /// Create a backend rooted at `root`. The directory is created if missing.
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The root directory of this backend.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl StorageGateway for LocalDiskStorage {
    async fn exists(&self, key: &str) -> bool {
        tokio::fs::try_exists(self.local_path(key))
            .await
            .unwrap_or(false)
    }

    fn is_local(&self) -> bool {
        true
    }

    fn local_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn remote_url(&self, key: &str) -> String {
        self.local_path(key).to_string_lossy().into_owned()
    }

    async fn make_dir(&self, key: &str) -> StorageResult<()> {
        tokio::fs::create_dir_all(self.local_path(key)).await?;
        Ok(())
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.local_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        tracing::debug!(key, bytes = data.len(), "stored blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        match tokio::fs::read(self.local_path(key)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(key))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        match tokio::fs::remove_file(self.local_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStorage::new(dir.path()).unwrap();

        assert!(!store.exists("videos/a.mp4").await);
        store
            .put("videos/a.mp4", Bytes::from_static(b"data"))
            .await
            .unwrap();
        assert!(store.exists("videos/a.mp4").await);
        assert_eq!(store.get("videos/a.mp4").await.unwrap().as_ref(), b"data");

        store.delete("videos/a.mp4").await.unwrap();
        assert!(!store.exists("videos/a.mp4").await);
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStorage::new(dir.path()).unwrap();

        let err = store.get("nope.mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStorage::new(dir.path()).unwrap();
        store.delete("nope.mp4").await.unwrap();
    }

    #[tokio::test]
    async fn make_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStorage::new(dir.path()).unwrap();
        store.make_dir("a/b/c").await.unwrap();
        assert!(dir.path().join("a/b/c").is_dir());
    }

    #[test]
    fn local_paths_join_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStorage::new(dir.path()).unwrap();
        assert_eq!(store.local_path("x/y.mp4"), dir.path().join("x/y.mp4"));
        assert!(store.is_local());
    }
}
