use chrono::{DateTime, Utc};
use common::storage::{image_extension, validate_photo_key};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{
    Validate, double_option, validate_latitude, validate_length, validate_longitude,
    validate_optional_max,
};
use crate::error::AppError;

const METADATA_MAX: usize = 500;

/// Request for a presigned photo upload URL.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    /// Client-chosen key: a UUID followed by an image extension.
    #[schema(example = "00000000-0000-0000-0000-000000000001.jpg")]
    pub file_name: String,
    #[schema(example = "image/jpeg")]
    pub content_type: String,
}

impl Validate for UploadUrlRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_photo_key(self.file_name.trim())
            .map_err(|e| AppError::invalid_field("fileName", e.to_string()))?;
        if !self.content_type.trim().starts_with("image/") {
            return Err(AppError::invalid_field(
                "contentType",
                "Content type must be an image type",
            ));
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    /// Presigned PUT URL, valid for five minutes.
    pub upload_url: String,
    /// Key to send back when creating the pastille.
    pub file_key: String,
}

/// Request body for creating a pastille.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePastilleRequest {
    #[schema(example = "Eiffel Tower")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = 48.858)]
    pub latitude: f64,
    #[schema(example = 2.294)]
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub external_link: Option<String>,
    pub architectural_style: Option<String>,
    pub construction_period: Option<String>,
    pub opening_hours: Option<String>,
    /// Key of the photo already uploaded through a presigned URL.
    #[schema(example = "00000000-0000-0000-0000-000000000001.jpg")]
    pub file_key: String,
}

impl Validate for CreatePastilleRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_length("title", "Title", &self.title, 1, 200)?;
        validate_optional_max("description", "Description", self.description.as_deref(), 4000)?;
        validate_latitude("latitude", self.latitude)?;
        validate_longitude("longitude", self.longitude)?;
        validate_metadata(
            self.external_link.as_deref(),
            self.architectural_style.as_deref(),
            self.construction_period.as_deref(),
            self.opening_hours.as_deref(),
        )?;
        validate_photo_key(self.file_key.trim())?;
        Ok(())
    }
}

fn validate_metadata(
    external_link: Option<&str>,
    architectural_style: Option<&str>,
    construction_period: Option<&str>,
    opening_hours: Option<&str>,
) -> Result<(), AppError> {
    validate_optional_max("externalLink", "External link", external_link, METADATA_MAX)?;
    validate_optional_max(
        "architecturalStyle",
        "Architectural style",
        architectural_style,
        METADATA_MAX,
    )?;
    validate_optional_max(
        "constructionPeriod",
        "Construction period",
        construction_period,
        METADATA_MAX,
    )?;
    validate_optional_max("openingHours", "Opening hours", opening_hours, METADATA_MAX)
}

/// Partial pastille update. Absent fields are left unchanged; `null` clears
/// optional fields.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePastilleRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub altitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub external_link: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub architectural_style: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub construction_period: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub opening_hours: Option<Option<String>>,
}

impl Validate for UpdatePastilleRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_length("title", "Title", title, 1, 200)?;
        }
        validate_optional_max(
            "description",
            "Description",
            self.description.as_ref().and_then(|d| d.as_deref()),
            4000,
        )?;
        if let Some(latitude) = self.latitude {
            validate_latitude("latitude", latitude)?;
        }
        if let Some(longitude) = self.longitude {
            validate_longitude("longitude", longitude)?;
        }
        validate_metadata(
            self.external_link.as_ref().and_then(|v| v.as_deref()),
            self.architectural_style.as_ref().and_then(|v| v.as_deref()),
            self.construction_period.as_ref().and_then(|v| v.as_deref()),
            self.opening_hours.as_ref().and_then(|v| v.as_deref()),
        )
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplacePhotoRequest {
    #[schema(example = "00000000-0000-0000-0000-000000000002.jpg")]
    pub file_key: String,
}

impl Validate for ReplacePhotoRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_photo_key(self.file_key.trim())?;
        Ok(())
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RateRequest {
    /// Score from 1 to 5.
    #[schema(example = 5, minimum = 1, maximum = 5)]
    pub rating: i32,
}

impl Validate for RateRequest {
    fn validate(&self) -> Result<(), AppError> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::invalid_field(
                "rating",
                "Rating must be between 1 and 5",
            ));
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    #[schema(example = 4.5)]
    pub average_rating: f64,
    pub rating_count: u64,
}

#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    pub id: Uuid,
    /// Presigned download URL; empty for photos still awaiting key repair.
    pub image_url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Public pastille shape, with derived fields computed at read time.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PastilleResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub external_link: Option<String>,
    pub architectural_style: Option<String>,
    pub construction_period: Option<String>,
    pub opening_hours: Option<String>,
    pub created_by_user_id: Uuid,
    #[schema(example = "Alice")]
    pub created_by_user_name: String,
    pub created_at: DateTime<Utc>,
    /// Mean of all ratings, 0 when unrated.
    pub average_rating: f64,
    pub rating_count: u64,
    /// URL of the first resolved photo.
    pub photo_url: Option<String>,
    pub photos: Vec<PhotoResponse>,
}

/// Extension to use for a file name, defaulting to jpg.
pub fn extension_or_jpg(file_name: &str) -> String {
    image_extension(file_name).unwrap_or_else(|| "jpg".to_string())
}
