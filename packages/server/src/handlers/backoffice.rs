use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{ChangeAction, EntityKind};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::api_key::AdminKey;
use crate::extractors::json::AppJson;
use crate::models::backoffice::{
    AdminPastilleDetail, AdminPastilleSummary, AdminUserDetail, AdminUserSummary,
    DashboardStats, RecentActivity, RepairReport,
};
use crate::models::pastille::{PastilleResponse, UpdatePastilleRequest};
use crate::models::quiz::{AdminCreateQuizRequest, QuizResponse, QuizSummary, UpdateQuizRequest};
use crate::models::zone::{AdminCreateZoneRequest, ZoneRequest, ZoneResponse};
use crate::services::{backoffice, pastille, quiz, repair, zone};
use crate::state::AppState;

// --- Dashboard ---

#[utoipa::path(
    get,
    path = "/backoffice/dashboard-stats",
    tag = "Back Office",
    operation_id = "adminDashboardStats",
    summary = "Global counters",
    responses(
        (status = 200, description = "Dashboard counters", body = DashboardStats),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn dashboard_stats(
    _admin: AdminKey,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(backoffice::dashboard_stats(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/backoffice/recent-activities",
    tag = "Back Office",
    operation_id = "adminRecentActivities",
    summary = "Latest pastilles and registrations",
    responses(
        (status = 200, description = "At most ten entries, newest first", body = Vec<RecentActivity>),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn recent_activities(
    _admin: AdminKey,
    State(state): State<AppState>,
) -> Result<Json<Vec<RecentActivity>>, AppError> {
    Ok(Json(backoffice::recent_activities(&state.db).await?))
}

// --- Users ---

#[utoipa::path(
    get,
    path = "/backoffice/users",
    tag = "Back Office",
    operation_id = "adminListUsers",
    summary = "List users",
    responses(
        (status = 200, description = "All users, newest first", body = Vec<AdminUserSummary>),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn list_users(
    _admin: AdminKey,
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminUserSummary>>, AppError> {
    Ok(Json(backoffice::list_users(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/backoffice/users/{id}",
    tag = "Back Office",
    operation_id = "adminGetUser",
    summary = "Get a user",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = AdminUserDetail),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin), fields(user_id = %id))]
pub async fn get_user(
    _admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminUserDetail>, AppError> {
    Ok(Json(backoffice::user_detail(&state.db, &state.storage, id).await?))
}

#[utoipa::path(
    delete,
    path = "/backoffice/users/{id}",
    tag = "Back Office",
    operation_id = "adminDeleteUser",
    summary = "Delete a user",
    description = "Refused while the user still owns pastilles or zones.",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "User still owns content (CONFLICT)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin), fields(user_id = %id))]
pub async fn delete_user(
    _admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    backoffice::delete_user(&state.db, &state.storage, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Pastilles ---

#[utoipa::path(
    get,
    path = "/backoffice/pastilles",
    tag = "Back Office",
    operation_id = "adminListPastilles",
    summary = "List pastilles",
    responses(
        (status = 200, description = "All pastilles, newest first", body = Vec<AdminPastilleSummary>),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn list_pastilles(
    _admin: AdminKey,
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminPastilleSummary>>, AppError> {
    Ok(Json(backoffice::list_pastilles(&state.db, &state.storage).await?))
}

#[utoipa::path(
    get,
    path = "/backoffice/pastilles/{id}",
    tag = "Back Office",
    operation_id = "adminGetPastille",
    summary = "Get a pastille with its quizzes",
    params(("id" = Uuid, Path, description = "Pastille ID")),
    responses(
        (status = 200, description = "Pastille details", body = AdminPastilleDetail),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "Pastille not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin), fields(pastille_id = %id))]
pub async fn get_pastille(
    _admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminPastilleDetail>, AppError> {
    Ok(Json(
        backoffice::pastille_detail(&state.db, &state.storage, id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/backoffice/pastilles/{id}",
    tag = "Back Office",
    operation_id = "adminUpdatePastille",
    summary = "Update any pastille",
    params(("id" = Uuid, Path, description = "Pastille ID")),
    request_body = UpdatePastilleRequest,
    responses(
        (status = 200, description = "Pastille updated", body = PastilleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "Pastille not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, admin, payload), fields(pastille_id = %id))]
pub async fn update_pastille(
    admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdatePastilleRequest>,
) -> Result<Json<PastilleResponse>, AppError> {
    let view = pastille::update(&state.db, &state.storage, admin.actor(), id, payload).await?;
    state.broadcaster.notify(EntityKind::Pastille, id, ChangeAction::Updated);

    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/backoffice/pastilles/{id}",
    tag = "Back Office",
    operation_id = "adminDeletePastille",
    summary = "Delete any pastille",
    params(("id" = Uuid, Path, description = "Pastille ID")),
    responses(
        (status = 204, description = "Pastille deleted"),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "Pastille not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, admin), fields(pastille_id = %id))]
pub async fn delete_pastille(
    admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    pastille::delete(&state.db, &state.storage, admin.actor(), id).await?;
    state.broadcaster.notify(EntityKind::Pastille, id, ChangeAction::Deleted);

    Ok(StatusCode::NO_CONTENT)
}

// --- Quizzes ---

#[utoipa::path(
    get,
    path = "/backoffice/quizzes",
    tag = "Back Office",
    operation_id = "adminListQuizzes",
    summary = "List quizzes",
    responses(
        (status = 200, description = "All quizzes, newest first", body = Vec<QuizSummary>),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn list_quizzes(
    _admin: AdminKey,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuizSummary>>, AppError> {
    Ok(Json(backoffice::list_quizzes(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/backoffice/quizzes/{id}",
    tag = "Back Office",
    operation_id = "adminGetQuiz",
    summary = "Get a quiz with its solution",
    params(("id" = Uuid, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Quiz with correctness flags", body = QuizResponse),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "Quiz not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin), fields(quiz_id = %id))]
pub async fn get_quiz(
    _admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizResponse>, AppError> {
    let (model, answers) = quiz::load(&state.db, None, id).await?;
    Ok(Json(QuizResponse::with_solution(model, answers)))
}

#[utoipa::path(
    post,
    path = "/backoffice/quizzes",
    tag = "Back Office",
    operation_id = "adminCreateQuiz",
    summary = "Create a quiz on any pastille",
    request_body = AdminCreateQuizRequest,
    responses(
        (status = 201, description = "Quiz created", body = QuizResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "Pastille not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, admin, payload), fields(pastille_id = %payload.pastille_id))]
pub async fn create_quiz(
    admin: AdminKey,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AdminCreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = quiz::create(&state.db, admin.actor(), payload.pastille_id, payload.quiz).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/backoffice/quizzes/{id}",
    tag = "Back Office",
    operation_id = "adminUpdateQuiz",
    summary = "Update any quiz",
    params(("id" = Uuid, Path, description = "Quiz ID")),
    request_body = UpdateQuizRequest,
    responses(
        (status = 200, description = "Quiz updated", body = QuizResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "Quiz not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, admin, payload), fields(quiz_id = %id))]
pub async fn update_quiz(
    admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateQuizRequest>,
) -> Result<Json<QuizResponse>, AppError> {
    Ok(Json(
        quiz::update(&state.db, admin.actor(), None, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/backoffice/quizzes/{id}",
    tag = "Back Office",
    operation_id = "adminDeleteQuiz",
    summary = "Delete any quiz",
    params(("id" = Uuid, Path, description = "Quiz ID")),
    responses(
        (status = 204, description = "Quiz deleted"),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "Quiz not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, admin), fields(quiz_id = %id))]
pub async fn delete_quiz(
    admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    quiz::delete(&state.db, admin.actor(), None, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Zones ---

#[utoipa::path(
    get,
    path = "/backoffice/zones",
    tag = "Back Office",
    operation_id = "adminListZones",
    summary = "List zones",
    responses(
        (status = 200, description = "All zones, newest first", body = Vec<ZoneResponse>),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn list_zones(
    _admin: AdminKey,
    State(state): State<AppState>,
) -> Result<Json<Vec<ZoneResponse>>, AppError> {
    Ok(Json(zone::list_views(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/backoffice/zones/{id}",
    tag = "Back Office",
    operation_id = "adminGetZone",
    summary = "Get a zone",
    params(("id" = Uuid, Path, description = "Zone ID")),
    responses(
        (status = 200, description = "Zone details", body = ZoneResponse),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "Zone not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin), fields(zone_id = %id))]
pub async fn get_zone(
    _admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ZoneResponse>, AppError> {
    zone::load_view(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Zone not found".into()))
}

#[utoipa::path(
    post,
    path = "/backoffice/zones",
    tag = "Back Office",
    operation_id = "adminCreateZone",
    summary = "Create a zone on behalf of a user",
    request_body = AdminCreateZoneRequest,
    responses(
        (status = 201, description = "Zone created", body = ZoneResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "Owner not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin, payload), fields(owner_id = %payload.created_by_user_id))]
pub async fn create_zone(
    _admin: AdminKey,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AdminCreateZoneRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = zone::create(&state.db, payload.created_by_user_id, payload.zone).await?;
    state.broadcaster.notify(EntityKind::Zone, created.id, ChangeAction::Created);

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/backoffice/zones/{id}",
    tag = "Back Office",
    operation_id = "adminUpdateZone",
    summary = "Update any zone",
    params(("id" = Uuid, Path, description = "Zone ID")),
    request_body = ZoneRequest,
    responses(
        (status = 200, description = "Zone updated", body = ZoneResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "Zone not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, admin, payload), fields(zone_id = %id))]
pub async fn update_zone(
    admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<ZoneRequest>,
) -> Result<Json<ZoneResponse>, AppError> {
    let updated = zone::update(&state.db, admin.actor(), id, payload).await?;
    state.broadcaster.notify(EntityKind::Zone, id, ChangeAction::Updated);

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/backoffice/zones/{id}",
    tag = "Back Office",
    operation_id = "adminDeleteZone",
    summary = "Delete any zone",
    params(("id" = Uuid, Path, description = "Zone ID")),
    responses(
        (status = 204, description = "Zone deleted"),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 404, description = "Zone not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, admin), fields(zone_id = %id))]
pub async fn delete_zone(
    admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    zone::delete(&state.db, admin.actor(), id).await?;
    state.broadcaster.notify(EntityKind::Zone, id, ChangeAction::Deleted);

    Ok(StatusCode::NO_CONTENT)
}

// --- Maintenance ---

#[utoipa::path(
    post,
    path = "/backoffice/maintenance/fix-photo-keys",
    tag = "Back Office",
    operation_id = "adminFixPhotoKeys",
    summary = "Repair legacy photo keys",
    description = "Renames every photo object still stored under its original file name to a fresh `{uuid}.jpg` key. Rows are handled one by one; failures are reported without undoing successes.",
    responses(
        (status = 200, description = "Repair report", body = RepairReport),
        (status = 401, description = "Missing or wrong key (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn fix_photo_keys(
    _admin: AdminKey,
    State(state): State<AppState>,
) -> Result<Json<RepairReport>, AppError> {
    Ok(Json(repair::fix_photo_keys(&state.db, &state.storage).await?))
}
