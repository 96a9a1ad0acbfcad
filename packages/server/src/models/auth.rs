use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{Validate, validate_email, validate_length, validate_password};
use super::user::UserResponse;
use crate::error::AppError;

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Email address, unique case-insensitively.
    #[schema(example = "a@x.com")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "Secret123!")]
    pub password: String,
    /// Public name (3-50 characters).
    #[schema(example = "Alice")]
    pub display_name: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_email(&self.email)?;
        validate_password("password", &self.password)?;
        validate_length("displayName", "Display name", &self.display_name, 3, 50)
    }
}

/// Successful registration response.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: Uuid,
    #[schema(example = "a@x.com")]
    pub email: String,
    #[schema(example = "Alice")]
    pub display_name: String,
}

impl From<crate::entity::user::Model> for RegisterResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
        }
    }
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "a@x.com")]
    pub email: String,
    #[schema(example = "Secret123!")]
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() {
            return Err(AppError::invalid_field("email", "Email must not be empty"));
        }
        if self.password.is_empty() {
            return Err(AppError::invalid_field(
                "password",
                "Password must not be empty",
            ));
        }
        Ok(())
    }
}

/// Request body for refresh-token rotation.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Refresh token returned by the last login or refresh.
    pub refresh_token: String,
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.refresh_token.trim().is_empty() {
            return Err(AppError::invalid_field(
                "refreshToken",
                "Refresh token must not be empty",
            ));
        }
        Ok(())
    }
}

/// Tokens issued by login and refresh.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Bearer access token (JWT).
    pub token: String,
    /// Expiry of `token`.
    pub expiration: DateTime<Utc>,
    /// Single-use refresh token; rotate it through `/api/auth/refresh`.
    pub refresh_token: String,
    pub user: UserResponse,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ForgotPasswordRequest {
    #[schema(example = "a@x.com")]
    pub email: String,
}

impl Validate for ForgotPasswordRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() {
            return Err(AppError::invalid_field("email", "Email must not be empty"));
        }
        Ok(())
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    /// Token from the reset link, as received.
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() || self.token.trim().is_empty() {
            return Err(AppError::validation("Email and token are required"));
        }
        validate_password("newPassword", &self.new_password)?;
        if self.new_password != self.confirm_password {
            return Err(AppError::invalid_field(
                "confirmPassword",
                "Passwords do not match",
            ));
        }
        Ok(())
    }
}
