use uuid::Uuid;

use super::error::StorageError;

/// Extensions accepted for client-uploaded photos.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic"];

/// Lower-cased extension of `name` if it is one of [`IMAGE_EXTENSIONS`].
pub fn image_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Check that a photo key looks like `{uuid}.{image extension}`.
///
/// Clients pick their own keys before uploading through a presigned URL, so
/// the stem must be a UUID to keep keys unguessable and collision-free.
pub fn validate_photo_key(key: &str) -> Result<(), StorageError> {
    let (stem, _) = key
        .rsplit_once('.')
        .ok_or_else(|| StorageError::InvalidKey(format!("'{key}' has no extension")))?;

    if !is_hyphenated_uuid(stem) {
        return Err(StorageError::InvalidKey(format!(
            "'{key}' must be named after a UUID"
        )));
    }
    if image_extension(key).is_none() {
        return Err(StorageError::InvalidKey(format!(
            "'{key}' must end with one of: {}",
            IMAGE_EXTENSIONS.join(", ")
        )));
    }
    Ok(())
}

// `Uuid::try_parse` also takes the simple, braced and urn forms.
fn is_hyphenated_uuid(stem: &str) -> bool {
    stem.len() == 36 && Uuid::try_parse(stem).is_ok()
}

/// Server-assigned key for a photo row, derived from its id so that a
/// repeated assignment lands on the same object.
pub fn photo_key_for(photo_id: Uuid, ext: &str) -> String {
    format!("{photo_id}.{ext}")
}

/// Key of a user's avatar. One object per user; re-uploads overwrite it.
pub fn avatar_key(user_id: Uuid, ext: &str) -> String {
    format!("avatars/{user_id}.{ext}")
}

/// Last path segment of a key, used as the display file name.
pub fn file_name_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
