/// Errors that can occur during object storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(String),
    /// The object key does not follow the expected naming scheme.
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    /// The backend answered a write with a non-success status.
    #[error("write of {key} rejected with status {status}")]
    WriteFailed { key: String, status: u16 },
    /// A presigned URL could not be parsed or does not match the operation.
    #[error("invalid presigned url: {0}")]
    InvalidUrl(String),
    /// A presigned URL was used after its expiry.
    #[error("presigned url has expired")]
    Expired,
    /// Transport or SDK failure talking to the backend.
    #[error("storage backend error: {0}")]
    Backend(String),
}
