//! # clipflow-storage
//!
//! Storage tier contract consumed by the clipflow orchestration layer.
//!
//! A storage backend is either "local" (the ffmpeg binary can read and write
//! its files directly through the filesystem) or "remote" (finished artifacts
//! must be copied out after local processing). Keys are relative,
//! slash-separated paths; every backend also designates a local scratch root
//! where intermediate files live regardless of tier.

mod local;

pub use local::LocalDiskStorage;

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

/// Result type alias using our StorageError type.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested key does not exist in the backend.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// An I/O error occurred while talking to the backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A backend-specific failure (network, credentials, quota, ...).
    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Create a not-found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Contract between the orchestration layer and a key-addressed blob store.
///
/// `local_path` must be answerable for any key, whether or not the key exists
/// yet: transcode steps write their output to the local path first and publish
/// to the remote tier afterwards.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Whether the key currently exists in the backend tier.
    async fn exists(&self, key: &str) -> bool;

    /// Whether the backend is the local tier (directly filesystem-accessible
    /// to external tools).
    fn is_local(&self) -> bool;

    /// Filesystem path where the key is (or will be) stored locally.
    fn local_path(&self, key: &str) -> PathBuf;

    /// URL under which the key can be fetched from the remote tier.
    fn remote_url(&self, key: &str) -> String;

    /// Create a directory (and any missing parents) for the given key prefix.
    async fn make_dir(&self, key: &str) -> StorageResult<()>;

    /// Store a blob under the given key.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Fetch the blob stored under the given key.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Remove the blob stored under the given key.
    async fn delete(&self, key: &str) -> StorageResult<()>;
}
