use std::time::Duration;

use async_trait::async_trait;

use super::error::StorageError;

/// Key-addressed object store with presigned URL support.
///
/// Implementations only need the primitive operations; rename semantics
/// live in [`super::StorageGateway`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Presigned URL allowing a single PUT of `key` until `ttl` elapses.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    /// Presigned URL allowing GETs of `key` until `ttl` elapses.
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Store bytes under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str)
    -> Result<(), StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Server-side copy within the same bucket.
    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError>;
}
