use crate::keys;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use vitrine_core::StorageBackend;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/vitrine/media")
    /// * `base_url` - Base URL for serving objects (e.g., "http://localhost:3000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert a storage key to a filesystem path, rejecting keys that could
    /// escape the base storage directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        keys::validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            keys::encode_key(key)
        )
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3000/media/".to_string())
            .await
            .unwrap();

        let url = storage
            .put("product-images/p1/main.jpg", b"abc".to_vec(), "image/jpeg")
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:3000/media/product-images/p1/main.jpg");
        let written = std::fs::read(dir.path().join("product-images/p1/main.jpg")).unwrap();
        assert_eq!(written, b"abc");
    }

    #[tokio::test]
    async fn test_put_same_key_overwrites_and_url_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3000/media".to_string())
            .await
            .unwrap();

        let first = storage
            .put("product-images/p1/main.jpg", b"one".to_vec(), "image/jpeg")
            .await
            .unwrap();
        let second = storage
            .put("product-images/p1/main.jpg", b"two".to_vec(), "image/jpeg")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first, storage.public_url("product-images/p1/main.jpg"));
        let written = std::fs::read(dir.path().join("product-images/p1/main.jpg")).unwrap();
        assert_eq!(written, b"two");
    }

    #[tokio::test]
    async fn test_put_rejects_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3000/media".to_string())
            .await
            .unwrap();

        let err = storage
            .put("../outside.jpg", b"abc".to_vec(), "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));

        let err = storage
            .put("/absolute.jpg", b"abc".to_vec(), "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
