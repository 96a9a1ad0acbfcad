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
use crate::models::zone::{ZoneRequest, ZoneResponse};
use crate::services::zone as service;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/zones",
    tag = "Zones",
    operation_id = "listZones",
    summary = "List all zones",
    responses(
        (status = 200, description = "All zones, newest first", body = Vec<ZoneResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_zones(State(state): State<AppState>) -> Result<Json<Vec<ZoneResponse>>, AppError> {
    Ok(Json(service::list_views(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/zones/{id}",
    tag = "Zones",
    operation_id = "getZone",
    summary = "Get a zone by ID",
    params(("id" = Uuid, Path, description = "Zone ID")),
    responses(
        (status = 200, description = "Zone details", body = ZoneResponse),
        (status = 404, description = "Zone not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(zone_id = %id))]
pub async fn get_zone(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ZoneResponse>, AppError> {
    service::load_view(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Zone not found".into()))
}

#[utoipa::path(
    post,
    path = "/zones",
    tag = "Zones",
    operation_id = "createZone",
    summary = "Create a zone",
    description = "A zone is a named polygon of at least three vertices.",
    request_body = ZoneRequest,
    responses(
        (status = 201, description = "Zone created", body = ZoneResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, name = %payload.name))]
pub async fn create_zone(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ZoneRequest>,
) -> Result<impl IntoResponse, AppError> {
    let zone = service::create(&state.db, auth_user.user_id, payload).await?;
    state.broadcaster.notify(EntityKind::Zone, zone.id, ChangeAction::Created);

    Ok((StatusCode::CREATED, Json(zone)))
}

#[utoipa::path(
    put,
    path = "/zones/{id}",
    tag = "Zones",
    operation_id = "updateZone",
    summary = "Replace a zone's name and polygon",
    description = "Only the creator may update.",
    params(("id" = Uuid, Path, description = "Zone ID")),
    request_body = ZoneRequest,
    responses(
        (status = 200, description = "Zone updated", body = ZoneResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the creator (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Zone not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, zone_id = %id))]
pub async fn update_zone(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<ZoneRequest>,
) -> Result<Json<ZoneResponse>, AppError> {
    let zone = service::update(&state.db, auth_user.actor(), id, payload).await?;
    state.broadcaster.notify(EntityKind::Zone, id, ChangeAction::Updated);

    Ok(Json(zone))
}

#[utoipa::path(
    delete,
    path = "/zones/{id}",
    tag = "Zones",
    operation_id = "deleteZone",
    summary = "Delete a zone",
    description = "Only the creator may delete.",
    params(("id" = Uuid, Path, description = "Zone ID")),
    responses(
        (status = 204, description = "Zone deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the creator (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Zone not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, zone_id = %id))]
pub async fn delete_zone(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service::delete(&state.db, auth_user.actor(), id).await?;
    state.broadcaster.notify(EntityKind::Zone, id, ChangeAction::Deleted);

    Ok(StatusCode::NO_CONTENT)
}
