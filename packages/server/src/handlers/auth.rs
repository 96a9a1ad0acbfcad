use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
    RegisterResponse, ResetPasswordRequest,
};
use crate::models::shared::MessageResponse;
use crate::models::user::UserResponse;
use crate::services::download_url;
use crate::services::session::{IssuedSession, SessionManager};
use crate::state::AppState;

fn session_manager(state: &AppState) -> SessionManager<'_, sea_orm::DatabaseConnection> {
    SessionManager::new(&state.db, &state.tokens, &state.config.auth)
}

async fn auth_response(state: &AppState, session: IssuedSession) -> AuthResponse {
    let avatar = match session.user.avatar_key.as_deref() {
        Some(key) => Some(download_url(&state.storage, key).await),
        None => None,
    };
    AuthResponse {
        token: session.token,
        expiration: session.expires_at,
        refresh_token: session.refresh_token,
        user: UserResponse::new(session.user, avatar),
    }
}

#[utoipa::path(
    post,
    path = "/users/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new user",
    description = "Creates an account. Emails are unique case-insensitively and stored lower-cased.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = session_manager(&state).register(&payload).await?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(RegisterResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with email and password",
    description = "Returns a short-lived access token and a refresh token. Logging in again invalidates the previous refresh token.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let session = session_manager(&state)
        .authenticate(&payload.email, &payload.password)
        .await?;
    Ok(Json(auth_response(&state, session).await))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    operation_id = "refreshToken",
    summary = "Rotate a refresh token",
    description = "Exchanges a refresh token for a new access/refresh pair. The presented refresh token is consumed.",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unknown, expired or already used token (SESSION_EXPIRED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let session = session_manager(&state)
        .rotate(payload.refresh_token.trim())
        .await?;
    Ok(Json(auth_response(&state, session).await))
}

#[utoipa::path(
    post,
    path = "/passwords/forgot-password",
    tag = "Auth",
    operation_id = "forgotPassword",
    summary = "Request a password reset email",
    description = "Always answers with the same message, whether or not the email is registered.",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Request accepted", body = MessageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    session_manager(&state)
        .issue_password_reset(&payload.email, state.mailer.as_ref())
        .await?;
    Ok(Json(MessageResponse::new(
        "If this email is registered, a reset link has been sent",
    )))
}

#[utoipa::path(
    post,
    path = "/passwords/reset-password",
    tag = "Auth",
    operation_id = "resetPassword",
    summary = "Set a new password with a reset token",
    description = "Consumes the token from the reset email. All existing sessions are revoked.",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Validation error or invalid token (VALIDATION_ERROR, RESET_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    session_manager(&state)
        .consume_password_reset(&payload.email, payload.token.trim(), &payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password has been reset")))
}
