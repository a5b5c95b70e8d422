//! Mock Storage implementation for testing

use crate::{Storage, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock storage implementation that stores files in memory
#[derive(Clone)]
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    backend_type: StorageBackend,
    fail_downloads: Arc<AtomicBool>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::with_backend(StorageBackend::S3)
    }

    pub fn with_backend(backend_type: StorageBackend) -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            backend_type,
            fail_downloads: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set a file in the mock storage
    pub fn set_file(&self, key: &str, data: impl Into<Vec<u8>>) {
        self.files.lock().unwrap().insert(key.to_string(), data.into());
    }

    /// Check if a file exists in the mock storage
    pub fn has_file(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    /// Make every download fail with a backend error
    pub fn fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(StorageError::DownloadFailed(
                "mock storage unavailable".to_string(),
            ));
        }
        self.files
            .lock()
            .unwrap()
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn presigned_put_url(
        &self,
        storage_key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!(
            "https://uploads.example.com/{}?X-Amz-Expires={}",
            storage_key,
            expires_in.as_secs()
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.files.lock().unwrap().contains_key(storage_key))
    }

    async fn check_health(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend_type
    }
}
