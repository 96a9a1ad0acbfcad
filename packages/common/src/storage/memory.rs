use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::error::StorageError;
use super::traits::ObjectStore;

const SCHEME: &str = "memory://";

/// An object held by [`InMemoryObjectStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Process-local object store for development and tests.
///
/// Presigned URLs have the form
/// `memory://{bucket}/{key}?method=PUT&expires={unix millis}&content-type=...`
/// and can be redeemed with [`Self::put_presigned`] / [`Self::get_presigned`],
/// which enforce the method and the expiry like a real blob store would.
pub struct InMemoryObjectStore {
    bucket: String,
    objects: DashMap<String, StoredObject>,
}

impl InMemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: DashMap::new(),
        }
    }

    /// Snapshot of the object stored under `key`.
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Perform the client side of a presigned upload.
    pub fn put_presigned(&self, url: &str, data: Vec<u8>) -> Result<(), StorageError> {
        let grant = self.redeem(url, "PUT")?;
        self.objects.insert(
            grant.key,
            StoredObject {
                data,
                content_type: grant
                    .content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            },
        );
        Ok(())
    }

    /// Perform the client side of a presigned download.
    pub fn get_presigned(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let grant = self.redeem(url, "GET")?;
        self.object(&grant.key)
            .map(|o| o.data)
            .ok_or(StorageError::NotFound(grant.key))
    }

    fn sign(&self, key: &str, method: &str, ttl: Duration, content_type: Option<&str>) -> String {
        let expires = Utc::now().timestamp_millis() + ttl.as_millis() as i64;
        let mut url = format!(
            "{SCHEME}{}/{key}?method={method}&expires={expires}",
            self.bucket
        );
        if let Some(ct) = content_type {
            url.push_str("&content-type=");
            url.push_str(ct);
        }
        url
    }

    fn redeem(&self, url: &str, method: &str) -> Result<Grant, StorageError> {
        let prefix = format!("{SCHEME}{}/", self.bucket);
        let rest = url
            .strip_prefix(&prefix)
            .ok_or_else(|| StorageError::InvalidUrl(format!("not issued by this store: {url}")))?;
        let (key, query) = rest
            .split_once('?')
            .ok_or_else(|| StorageError::InvalidUrl("missing query".into()))?;

        let mut signed_method = None;
        let mut expires = None;
        let mut content_type = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("method", v)) => signed_method = Some(v),
                Some(("expires", v)) => expires = v.parse::<i64>().ok(),
                Some(("content-type", v)) => content_type = Some(v.to_string()),
                _ => {}
            }
        }

        if signed_method != Some(method) {
            return Err(StorageError::InvalidUrl(format!(
                "url is not signed for {method}"
            )));
        }
        let expires = expires.ok_or_else(|| StorageError::InvalidUrl("missing expiry".into()))?;
        if Utc::now().timestamp_millis() > expires {
            return Err(StorageError::Expired);
        }

        Ok(Grant {
            key: key.to_string(),
            content_type,
        })
    }
}

struct Grant {
    key: String,
    content_type: Option<String>,
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        Ok(self.sign(key, "PUT", ttl, Some(content_type)))
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        Ok(self.sign(key, "GET", ttl, None))
    }

    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.contains(key))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.remove(key).is_some())
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let object = self
            .object(from)
            .ok_or_else(|| StorageError::NotFound(from.to_string()))?;
        self.objects.insert(to.to_string(), object);
        Ok(())
    }
}
