#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use modgate_core::StorageConfig;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config.bucket.clone().ok_or_else(|| {
                StorageError::ConfigError("UPLOAD_BUCKET not configured".to_string())
            })?;

            let storage = S3Storage::new(bucket, config.region.clone(), config.endpoint.clone())?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;

    fn local_config(path: Option<String>) -> StorageConfig {
        StorageConfig {
            backend: StorageBackend::Local,
            bucket: None,
            region: None,
            endpoint: None,
            local_path: path,
            presigned_url_expiry_secs: 3600,
        }
    }

    #[tokio::test]
    async fn creates_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let storage = create_storage(&local_config(Some(
            dir.path().to_string_lossy().into_owned(),
        )))
        .await
        .unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }

    #[tokio::test]
    async fn local_backend_requires_path() {
        let result = create_storage(&local_config(None)).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
