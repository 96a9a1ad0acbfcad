use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use common::storage::avatar_key;
use sea_orm::*;
use tracing::{instrument, warn};

use crate::entity::{pastille, user, user_quiz_attempt};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::pastille::extension_or_jpg;
use crate::models::shared::normalize_optional;
use crate::models::user::{
    ProfilePictureResponse, UpdateProfileRequest, UserResponse, UserStatsResponse, progress,
};
use crate::services::download_url;
use crate::state::AppState;

const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

pub fn avatar_body_limit() -> DefaultBodyLimit {
    // Room for multipart framing around the file itself.
    DefaultBodyLimit::max(MAX_AVATAR_BYTES + 64 * 1024)
}

async fn find_user(db: &DatabaseConnection, auth_user: &AuthUser) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(auth_user.user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

async fn user_response(state: &AppState, user: user::Model) -> UserResponse {
    let avatar = match user.avatar_key.as_deref() {
        Some(key) => Some(download_url(&state.storage, key).await),
        None => None,
    };
    UserResponse::new(user, avatar)
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    operation_id = "getMe",
    summary = "Get the current user's profile",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_user(&state.db, &auth_user).await?;
    Ok(Json(user_response(&state, user).await))
}

#[utoipa::path(
    put,
    path = "/users/me",
    tag = "Users",
    operation_id = "updateMe",
    summary = "Update the current user's profile",
    description = "Only provided fields are modified. A blank bio clears it.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_user(&state.db, &auth_user).await?;

    let mut active: user::ActiveModel = user.clone().into();
    if let Some(name) = payload.display_name {
        active.display_name = Set(name.trim().to_string());
    }
    if payload.bio.is_some() {
        active.bio = Set(normalize_optional(payload.bio));
    }
    let user = if active.is_changed() {
        active.update(&state.db).await?
    } else {
        user
    };

    Ok(Json(user_response(&state, user).await))
}

#[utoipa::path(
    get,
    path = "/users/my-stats",
    tag = "Users",
    operation_id = "getMyStats",
    summary = "Get the current user's progress",
    description = "`progress` is the share of the 50-pastille goal reached, capped at 1.",
    responses(
        (status = 200, description = "User statistics", body = UserStatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn my_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserStatsResponse>, AppError> {
    let user = find_user(&state.db, &auth_user).await?;

    let pastilles_count = pastille::Entity::find()
        .filter(pastille::Column::CreatedByUserId.eq(user.id))
        .count(&state.db)
        .await?;
    let quiz_attempts = user_quiz_attempt::Entity::find()
        .filter(user_quiz_attempt::Column::UserId.eq(user.id))
        .count(&state.db)
        .await?;
    let correct_attempts = user_quiz_attempt::Entity::find()
        .filter(user_quiz_attempt::Column::UserId.eq(user.id))
        .filter(user_quiz_attempt::Column::WasCorrect.eq(true))
        .count(&state.db)
        .await?;

    Ok(Json(UserStatsResponse {
        experience: user.experience,
        pastilles_count,
        quiz_attempts,
        correct_attempts,
        progress: progress(pastilles_count),
    }))
}

#[utoipa::path(
    post,
    path = "/users/me/profile-picture",
    tag = "Users",
    operation_id = "uploadProfilePicture",
    summary = "Upload a profile picture",
    description = "Multipart upload with a `file` field holding an image of at most 5 MiB. Replaces any previous picture.",
    request_body(content_type = "multipart/form-data", description = "Image file"),
    responses(
        (status = 200, description = "Picture stored", body = ProfilePictureResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Object storage rejected the file (STORAGE_WRITE_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn upload_profile_picture(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProfilePictureResponse>, AppError> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("avatar.jpg").to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| {
                mime_guess::from_path(&file_name)
                    .first()
                    .map(|m| m.to_string())
            })
            .unwrap_or_default();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read file: {e}")))?;
        upload = Some((file_name, content_type, data.to_vec()));
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| AppError::invalid_field("file", "Missing 'file' field"))?;
    if data.is_empty() {
        return Err(AppError::invalid_field("file", "File is empty"));
    }
    if data.len() > MAX_AVATAR_BYTES {
        return Err(AppError::invalid_field("file", "File must be at most 5 MiB"));
    }
    if !content_type.starts_with("image/") {
        return Err(AppError::invalid_field("file", "File must be an image"));
    }

    let user = find_user(&state.db, &auth_user).await?;
    let key = avatar_key(user.id, &extension_or_jpg(&file_name));
    let key = state.storage.upload(data, &key, &content_type).await?;

    if let Some(previous) = user.avatar_key.as_deref()
        && previous != key
        && let Err(e) = state.storage.delete(previous).await
    {
        warn!(key = previous, error = %e, "Could not delete previous profile picture");
    }

    let mut active: user::ActiveModel = user.into();
    active.avatar_key = Set(Some(key.clone()));
    active.update(&state.db).await?;

    Ok(Json(ProfilePictureResponse {
        profile_picture_url: download_url(&state.storage, &key).await,
    }))
}
