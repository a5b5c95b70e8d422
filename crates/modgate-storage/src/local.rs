use crate::traits::{validate_key, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

/// Local filesystem storage implementation
///
/// Used for local runs together with the in-memory queue. Objects are read
/// from directly under the base path; presigned URLs are not available.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance rooted at `base_path`, creating it if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(data)
    }

    async fn presigned_put_url(
        &self,
        _storage_key: &str,
        _content_type: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::ConfigError(
            "Presigned uploads require the s3 storage backend".to_string(),
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn check_health(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.base_path).await?;
        if !metadata.is_dir() {
            return Err(StorageError::BackendError(format!(
                "{} is not a directory",
                self.base_path.display()
            )));
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_storage_download() {
        let dir = tempdir().unwrap();
        tokio::fs::write(dir.path().join("abc-notes.txt"), b"you are worthless")
            .await
            .unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let downloaded = storage.download("abc-notes.txt").await.unwrap();
        assert_eq!(downloaded, b"you are worthless");
        assert!(storage.exists("abc-notes.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_nested_keys_are_resolved() {
        let dir = tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join("uploads/2024"))
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("uploads/2024/a b.md"), b"# hi")
            .await
            .unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        assert_eq!(storage.download("uploads/2024/a b.md").await.unwrap(), b"# hi");
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.download("missing.txt").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(!storage.exists("missing.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.download("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_presign_not_supported() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage
            .presigned_put_url("a.png", "image/png", Duration::from_secs(3600))
            .await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("bucket")).await.unwrap();
        assert!(storage.check_health().await.is_ok());
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }
}
