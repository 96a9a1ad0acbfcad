use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::quiz::{
    CreateQuizRequest, QuizAttemptRequest, QuizAttemptResponse, QuizResponse, UpdateQuizRequest,
};
use crate::services::{pastille, quiz as service};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/pastilles/{pastille_id}/quizzes",
    tag = "Quizzes",
    operation_id = "listQuizzes",
    summary = "List the quizzes of a pastille",
    description = "Answers are listed in display order without revealing which one is correct.",
    params(("pastille_id" = Uuid, Path, description = "Pastille ID")),
    responses(
        (status = 200, description = "Quizzes of the pastille", body = Vec<QuizResponse>),
        (status = 404, description = "Pastille not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(pastille_id = %pastille_id))]
pub async fn list_quizzes(
    State(state): State<AppState>,
    Path(pastille_id): Path<Uuid>,
) -> Result<Json<Vec<QuizResponse>>, AppError> {
    pastille::find_pastille(&state.db, pastille_id).await?;
    let quizzes = service::list_for_pastille(&state.db, pastille_id).await?;

    Ok(Json(
        quizzes
            .into_iter()
            .map(|(quiz, answers)| QuizResponse::public(quiz, answers))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/pastilles/{pastille_id}/quizzes/{quiz_id}",
    tag = "Quizzes",
    operation_id = "getQuiz",
    summary = "Get a quiz",
    params(
        ("pastille_id" = Uuid, Path, description = "Pastille ID"),
        ("quiz_id" = Uuid, Path, description = "Quiz ID"),
    ),
    responses(
        (status = 200, description = "Quiz without its solution", body = QuizResponse),
        (status = 404, description = "Quiz not found on this pastille (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(pastille_id = %pastille_id, quiz_id = %quiz_id))]
pub async fn get_quiz(
    State(state): State<AppState>,
    Path((pastille_id, quiz_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<QuizResponse>, AppError> {
    let (quiz, answers) = service::load(&state.db, Some(pastille_id), quiz_id).await?;
    Ok(Json(QuizResponse::public(quiz, answers)))
}

#[utoipa::path(
    post,
    path = "/pastilles/{pastille_id}/quizzes",
    tag = "Quizzes",
    operation_id = "createQuiz",
    summary = "Create a quiz on a pastille",
    description = "Only the pastille's creator may add quizzes. Multiple-choice quizzes need at least two answers and `correctAnswerIndex`; true/false quizzes get fixed True/False answers; free-text quizzes take exactly one answer.",
    params(("pastille_id" = Uuid, Path, description = "Pastille ID")),
    request_body = CreateQuizRequest,
    responses(
        (status = 201, description = "Quiz created, solution included", body = QuizResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the pastille's creator (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Pastille not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, pastille_id = %pastille_id))]
pub async fn create_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(pastille_id): Path<Uuid>,
    AppJson(payload): AppJson<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = service::create(&state.db, auth_user.actor(), pastille_id, payload).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

#[utoipa::path(
    put,
    path = "/pastilles/{pastille_id}/quizzes/{quiz_id}",
    tag = "Quizzes",
    operation_id = "updateQuiz",
    summary = "Update a quiz",
    description = "Only provided fields are modified. Sending `quizType`, `answers` or `correctAnswerIndex` rebuilds the answer set.",
    params(
        ("pastille_id" = Uuid, Path, description = "Pastille ID"),
        ("quiz_id" = Uuid, Path, description = "Quiz ID"),
    ),
    request_body = UpdateQuizRequest,
    responses(
        (status = 200, description = "Quiz updated, solution included", body = QuizResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the pastille's creator (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Quiz not found on this pastille (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, quiz_id = %quiz_id))]
pub async fn update_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((pastille_id, quiz_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<UpdateQuizRequest>,
) -> Result<Json<QuizResponse>, AppError> {
    let quiz = service::update(
        &state.db,
        auth_user.actor(),
        Some(pastille_id),
        quiz_id,
        payload,
    )
    .await?;
    Ok(Json(quiz))
}

#[utoipa::path(
    delete,
    path = "/pastilles/{pastille_id}/quizzes/{quiz_id}",
    tag = "Quizzes",
    operation_id = "deleteQuiz",
    summary = "Delete a quiz",
    params(
        ("pastille_id" = Uuid, Path, description = "Pastille ID"),
        ("quiz_id" = Uuid, Path, description = "Quiz ID"),
    ),
    responses(
        (status = 204, description = "Quiz deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the pastille's creator (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Quiz not found on this pastille (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, quiz_id = %quiz_id))]
pub async fn delete_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((pastille_id, quiz_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    service::delete(&state.db, auth_user.actor(), Some(pastille_id), quiz_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/pastilles/{pastille_id}/quizzes/{quiz_id}/attempt",
    tag = "Quizzes",
    operation_id = "attemptQuiz",
    summary = "Answer a quiz",
    description = "Choice quizzes take `selectedAnswerId`; free-text quizzes take `answerText`, compared trimmed and case-insensitively. One attempt per user and quiz; a correct answer earns 25 XP.",
    params(
        ("pastille_id" = Uuid, Path, description = "Pastille ID"),
        ("quiz_id" = Uuid, Path, description = "Quiz ID"),
    ),
    request_body = QuizAttemptRequest,
    responses(
        (status = 200, description = "Attempt evaluated", body = QuizAttemptResponse),
        (status = 400, description = "Missing or foreign answer (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Quiz not found on this pastille (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already attempted (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, quiz_id = %quiz_id))]
pub async fn attempt_quiz(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((pastille_id, quiz_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<QuizAttemptRequest>,
) -> Result<Json<QuizAttemptResponse>, AppError> {
    let outcome =
        service::attempt(&state.db, auth_user.user_id, pastille_id, quiz_id, &payload).await?;
    Ok(Json(outcome))
}
