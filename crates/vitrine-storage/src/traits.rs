//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement. The dispatcher receives a `Arc<dyn Storage>` at construction,
//! which is what allows tests to substitute an in-memory double.

use async_trait::async_trait;
use thiserror::Error;
use vitrine_core::StorageBackend;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

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
/// **Key format:** keys come from the [`keys`](crate::keys) module; they never
/// contain `..` or a leading `/`. Writing the same key twice overwrites the
/// object and yields the same URL, which is what makes retries idempotent.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload bytes under a key, overwriting any existing object.
    ///
    /// Returns the publicly accessible URL of the stored object.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String>;

    /// Deterministic public URL for a key, computable without any lookup.
    ///
    /// Must equal the URL `put` would return for the same key.
    fn public_url(&self, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
