use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{ChangeAction, EntityKind};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::pastille::{
    CreatePastilleRequest, PastilleResponse, RateRequest, RatingResponse, ReplacePhotoRequest,
    UpdatePastilleRequest, UploadUrlRequest, UploadUrlResponse,
};
use crate::services::pastille as service;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/pastilles/generate-upload-url",
    tag = "Pastilles",
    operation_id = "generateUploadUrl",
    summary = "Get a presigned URL to upload a photo",
    description = "The client PUTs the image bytes to `uploadUrl` within five minutes, then sends `fileKey` when creating the pastille. `fileName` must be a UUID with an image extension that no photo uses yet.",
    request_body = UploadUrlRequest,
    responses(
        (status = 200, description = "Presigned upload URL", body = UploadUrlResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Key already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, file_name = %payload.file_name))]
pub async fn generate_upload_url(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UploadUrlRequest>,
) -> Result<Json<UploadUrlResponse>, AppError> {
    let file_key = payload.file_name.trim().to_string();
    let upload_url = service::issue_upload_url(
        &state.db,
        &state.storage,
        &file_key,
        payload.content_type.trim(),
    )
    .await?;

    Ok(Json(UploadUrlResponse {
        upload_url,
        file_key,
    }))
}

#[utoipa::path(
    get,
    path = "/pastilles",
    tag = "Pastilles",
    operation_id = "listPastilles",
    summary = "List all pastilles",
    description = "Newest first, with presigned photo URLs and rating aggregates.",
    responses(
        (status = 200, description = "All pastilles", body = Vec<PastilleResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_pastilles(
    State(state): State<AppState>,
) -> Result<Json<Vec<PastilleResponse>>, AppError> {
    let views = service::list_views(&state.db, &state.storage, None).await?;
    Ok(Json(views))
}

#[utoipa::path(
    get,
    path = "/pastilles/my-pastilles",
    tag = "Pastilles",
    operation_id = "listMyPastilles",
    summary = "List the current user's pastilles",
    responses(
        (status = 200, description = "Pastilles created by the caller", body = Vec<PastilleResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_my_pastilles(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PastilleResponse>>, AppError> {
    let views = service::list_views(&state.db, &state.storage, Some(auth_user.user_id)).await?;
    Ok(Json(views))
}

#[utoipa::path(
    get,
    path = "/pastilles/{id}",
    tag = "Pastilles",
    operation_id = "getPastille",
    summary = "Get a pastille by ID",
    params(("id" = Uuid, Path, description = "Pastille ID")),
    responses(
        (status = 200, description = "Pastille details", body = PastilleResponse),
        (status = 404, description = "Pastille not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(pastille_id = %id))]
pub async fn get_pastille(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PastilleResponse>, AppError> {
    service::load_view(&state.db, &state.storage, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Pastille not found".into()))
}

#[utoipa::path(
    post,
    path = "/pastilles",
    tag = "Pastilles",
    operation_id = "createPastille",
    summary = "Create a pastille",
    description = "Creates the pastille and its photo from a previously uploaded `fileKey`, and awards the creator 50 XP.",
    request_body = CreatePastilleRequest,
    responses(
        (status = 201, description = "Pastille created", body = PastilleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Photo key already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, title = %payload.title))]
pub async fn create_pastille(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePastilleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = service::create(&state.db, &state.storage, auth_user.user_id, payload).await?;
    state.broadcaster.notify(EntityKind::Pastille, view.id, ChangeAction::Created);

    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    put,
    path = "/pastilles/{id}",
    tag = "Pastilles",
    operation_id = "updatePastille",
    summary = "Update a pastille",
    description = "Only provided fields are modified; `null` clears optional fields. Only the creator may update.",
    params(("id" = Uuid, Path, description = "Pastille ID")),
    request_body = UpdatePastilleRequest,
    responses(
        (status = 200, description = "Pastille updated", body = PastilleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the creator (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Pastille not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, pastille_id = %id))]
pub async fn update_pastille(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdatePastilleRequest>,
) -> Result<Json<PastilleResponse>, AppError> {
    let view = service::update(&state.db, &state.storage, auth_user.actor(), id, payload).await?;
    state.broadcaster.notify(EntityKind::Pastille, id, ChangeAction::Updated);

    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/pastilles/{id}",
    tag = "Pastilles",
    operation_id = "deletePastille",
    summary = "Delete a pastille",
    description = "Deletes the pastille with its photos, ratings and quizzes. Only the creator may delete.",
    params(("id" = Uuid, Path, description = "Pastille ID")),
    responses(
        (status = 204, description = "Pastille deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the creator (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Pastille not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, pastille_id = %id))]
pub async fn delete_pastille(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service::delete(&state.db, &state.storage, auth_user.actor(), id).await?;
    state.broadcaster.notify(EntityKind::Pastille, id, ChangeAction::Deleted);

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/pastilles/{id}/photo",
    tag = "Pastilles",
    operation_id = "replacePastillePhoto",
    summary = "Replace a pastille's photo",
    description = "Points the pastille at a newly uploaded object and deletes the previous one. Only the creator may replace.",
    params(("id" = Uuid, Path, description = "Pastille ID")),
    request_body = ReplacePhotoRequest,
    responses(
        (status = 200, description = "Photo replaced", body = PastilleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the creator (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Pastille not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Photo key already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, pastille_id = %id))]
pub async fn replace_photo(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<ReplacePhotoRequest>,
) -> Result<Json<PastilleResponse>, AppError> {
    let view = service::replace_photo(
        &state.db,
        &state.storage,
        auth_user.actor(),
        id,
        payload.file_key.trim(),
    )
    .await?;
    state.broadcaster.notify(EntityKind::Pastille, id, ChangeAction::Updated);

    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/pastilles/{id}/rate",
    tag = "Pastilles",
    operation_id = "ratePastille",
    summary = "Rate a pastille",
    description = "Scores from 1 to 5. Each user rates a pastille once and never their own.",
    params(("id" = Uuid, Path, description = "Pastille ID")),
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rating recorded", body = RatingResponse),
        (status = 400, description = "Out of range or own pastille (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Pastille not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already rated (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, pastille_id = %id, rating = payload.rating))]
pub async fn rate_pastille(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<RateRequest>,
) -> Result<Json<RatingResponse>, AppError> {
    let rating = service::rate(&state.db, auth_user.user_id, id, payload.rating).await?;
    state.broadcaster.notify(EntityKind::Pastille, id, ChangeAction::Updated);

    Ok(Json(rating))
}
