mod error;
mod gateway;
mod key;
mod memory;
#[cfg(feature = "object-storage")]
mod s3;
mod traits;

pub use error::StorageError;
pub use gateway::{DEFAULT_DOWNLOAD_TTL, DEFAULT_UPLOAD_TTL, StorageGateway};
pub use key::{
    IMAGE_EXTENSIONS, avatar_key, file_name_of, image_extension, photo_key_for,
    validate_photo_key,
};
pub use memory::{InMemoryObjectStore, StoredObject};
#[cfg(feature = "object-storage")]
pub use s3::{S3ObjectStore, S3Settings};
pub use traits::ObjectStore;
