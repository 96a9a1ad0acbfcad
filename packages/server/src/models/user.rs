use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{Validate, validate_length, validate_optional_max};
use crate::error::AppError;

/// Pastilles needed to fill the progress bar.
pub const PROGRESS_TARGET: u64 = 50;

/// A user's own profile.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "a@x.com")]
    pub email: String,
    #[schema(example = "Alice")]
    pub display_name: String,
    pub bio: Option<String>,
    #[schema(example = 75)]
    pub experience: i32,
    pub created_at: DateTime<Utc>,
    /// Presigned download URL of the avatar.
    pub profile_picture_url: Option<String>,
}

impl UserResponse {
    pub fn new(user: crate::entity::user::Model, profile_picture_url: Option<String>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            bio: user.bio,
            experience: user.experience,
            created_at: user.created_at,
            profile_picture_url,
        }
    }
}

/// Profile update. Absent fields are left unchanged.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// New display name (3-50 characters).
    pub display_name: Option<String>,
    /// New bio (at most 500 characters). Blank clears it.
    pub bio: Option<String>,
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.display_name {
            validate_length("displayName", "Display name", name, 3, 50)?;
        }
        validate_optional_max("bio", "Bio", self.bio.as_deref(), 500)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub experience: i32,
    pub pastilles_count: u64,
    pub quiz_attempts: u64,
    pub correct_attempts: u64,
    /// Share of the pastille target reached, from 0 to 1.
    #[schema(example = 0.2)]
    pub progress: f64,
}

/// `min(count / target, 1)`.
pub fn progress(pastilles_count: u64) -> f64 {
    (pastilles_count as f64 / PROGRESS_TARGET as f64).min(1.0)
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePictureResponse {
    pub profile_picture_url: String,
}
