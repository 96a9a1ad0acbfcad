use std::time::Duration;

use async_trait::async_trait;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use s3::creds::Credentials;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::traits::ObjectStore;

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, R2, ...). Empty means the AWS endpoint of `region`.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Object store backed by an S3-compatible bucket through `rust-s3`.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
}

impl S3ObjectStore {
    pub fn new(settings: &S3Settings) -> Result<Self, StorageError> {
        let region = if settings.endpoint.is_empty() {
            settings.region.parse::<Region>().map_err(backend)?
        } else {
            Region::Custom {
                region: settings.region.clone(),
                endpoint: settings.endpoint.clone(),
            }
        };

        let credentials = Credentials::new(
            Some(&settings.access_key),
            Some(&settings.secret_key),
            None,
            None,
            None,
        )
        .map_err(backend)?;

        let bucket = Bucket::new(&settings.bucket, region, credentials)
            .map_err(backend)?
            .with_path_style();

        Ok(Self { bucket })
    }
}

fn backend(err: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn expiry_secs(ttl: Duration) -> u32 {
    u32::try_from(ttl.as_secs()).unwrap_or(u32::MAX)
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        // Signed, so the upload must carry exactly this Content-Type.
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(content_type).map_err(backend)?,
        );
        self.bucket
            .presign_put(key, expiry_secs(ttl), Some(headers), None)
            .await
            .map_err(backend)
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        self.bucket
            .presign_get(key, expiry_secs(ttl), None)
            .await
            .map_err(backend)
    }

    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(backend)?;

        let status = response.status_code();
        if !is_success(status) {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                status,
            });
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let (_, status) = self.bucket.head_object(key).await.map_err(backend)?;
        Ok(is_success(status))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        // S3 answers 204 whether or not the key existed, so check first.
        let existed = self.exists(key).await?;
        let response = self.bucket.delete_object(key).await.map_err(backend)?;
        let status = response.status_code();
        if !is_success(status) && status != 404 {
            return Err(StorageError::Backend(format!(
                "DELETE {key} returned status {status}"
            )));
        }
        Ok(existed)
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let status = self
            .bucket
            .copy_object_internal(from, to)
            .await
            .map_err(backend)?;
        match status {
            404 => Err(StorageError::NotFound(from.to_string())),
            status if is_success(status) => Ok(()),
            status => Err(StorageError::WriteFailed {
                key: to.to_string(),
                status,
            }),
        }
    }
}
