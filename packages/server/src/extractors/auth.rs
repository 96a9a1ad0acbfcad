use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::access::Actor;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Ownership checks happen through `ensure_owner()` with [`AuthUser::actor`].
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::User(self.user_id)
    }
}

/// Decode an access token into the user it was issued to.
pub fn authenticate_token(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| AppError::TokenInvalid)?;
    let user_id = claims.user_id().ok_or(AppError::TokenInvalid)?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
        name: claims.name,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        authenticate_token(state, token)
    }
}
