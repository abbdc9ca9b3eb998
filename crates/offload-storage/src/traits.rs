//! Storage abstraction trait
//!
//! This module defines the capability trait every storage backend must
//! implement. The engine only ever talks to `dyn Storage`, so the uploader
//! stays decoupled from backend details.

use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// The offload engine uploads whole files and rewrites references to them;
/// that is the entire surface it needs from a backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload a file and return (storage_key, public_url).
    ///
    /// The storage key is derived from the filename (see the `keys` module)
    /// and identifies the object for later delete/exists calls; the URL is
    /// the publicly reachable address written back into the host's records.
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)>;

    /// Upload data to an explicit storage key (derived renditions).
    /// Returns the public URL for the uploaded object.
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Delete an object by its storage key. Deleting a missing object is not
    /// an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if an object exists.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
