use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::error::StorageError;
use super::traits::ObjectStore;

/// Lifetime of presigned upload URLs.
pub const DEFAULT_UPLOAD_TTL: Duration = Duration::from_secs(5 * 60);
/// Lifetime of presigned download URLs.
pub const DEFAULT_DOWNLOAD_TTL: Duration = Duration::from_secs(7 * 60 * 60);

/// Application-facing storage operations on top of an [`ObjectStore`].
///
/// File bytes normally travel directly between clients and the store
/// through presigned URLs; only small assets go through [`Self::upload`].
#[derive(Clone)]
pub struct StorageGateway {
    store: Arc<dyn ObjectStore>,
    upload_ttl: Duration,
    download_ttl: Duration,
}

impl StorageGateway {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            upload_ttl: DEFAULT_UPLOAD_TTL,
            download_ttl: DEFAULT_DOWNLOAD_TTL,
        }
    }

    pub fn with_ttls(mut self, upload_ttl: Duration, download_ttl: Duration) -> Self {
        self.upload_ttl = upload_ttl;
        self.download_ttl = download_ttl;
        self
    }

    /// Whether an object is stored under `key`.
    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        if key.is_empty() {
            return Ok(false);
        }
        self.store.exists(key).await
    }

    /// Presigned PUT for exactly `key`.
    pub async fn generate_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("key must not be empty".into()));
        }
        self.store.presign_put(key, content_type, self.upload_ttl).await
    }

    /// Presigned GET for `key`. An empty key yields an empty URL.
    pub async fn generate_download_url(&self, key: &str) -> Result<String, StorageError> {
        if key.is_empty() {
            return Ok(String::new());
        }
        self.store.presign_get(key, self.download_ttl).await
    }

    /// Server-side upload, returning the key written.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.store.put(key, data, content_type).await?;
        Ok(key.to_string())
    }

    /// Remove `key`. A missing object is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if key.is_empty() {
            return Ok(());
        }
        self.store.delete(key).await.map(|_| ())
    }

    /// Copy `old_key` to `new_key`, then delete `old_key`.
    ///
    /// If the copy succeeded but the delete did not, both objects stay in
    /// the bucket and the rename still counts as done.
    pub async fn rename(&self, old_key: &str, new_key: &str) -> Result<(), StorageError> {
        if old_key == new_key {
            return Ok(());
        }
        self.store.copy(old_key, new_key).await?;
        if let Err(e) = self.store.delete(old_key).await {
            warn!(old_key, new_key, error = %e, "Rename left the source object behind");
        }
        Ok(())
    }
}
