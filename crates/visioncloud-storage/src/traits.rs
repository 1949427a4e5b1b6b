//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use visioncloud_core::{Category, StorageBackend};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) implement this trait so the
/// pipeline can persist results without coupling to a specific backend.
///
/// Each `put` is atomic from the caller's point of view: either a locator is
/// returned or an error is, with no partially written object visible.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` at `{category}/{key}` and return its locator.
    async fn put(&self, category: Category, key: &str, data: Bytes) -> StorageResult<String>;

    /// Fetch the bytes stored at `{category}/{key}`.
    async fn get(&self, category: Category, key: &str) -> StorageResult<Bytes>;

    /// Keys stored under `category`, relative to the category prefix, sorted.
    async fn list(&self, category: Category) -> StorageResult<Vec<String>>;

    /// Remove `{category}/{key}`. Deleting a missing object is not an error.
    async fn delete(&self, category: Category, key: &str) -> StorageResult<()>;

    /// The locator `put` returns for this address, computed without I/O.
    fn locator(&self, category: Category, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
