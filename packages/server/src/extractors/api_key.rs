use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::access::Actor;

pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Back-office caller authenticated by the shared `X-API-KEY` secret.
pub struct AdminKey;

impl AdminKey {
    pub fn actor(&self) -> Actor {
        Actor::Admin
    }
}

impl FromRequestParts<AppState> for AdminKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.config.backoffice.api_key.as_str();
        if expected.is_empty() {
            return Err(AppError::Internal(
                "backoffice.api_key is not configured".into(),
            ));
        }

        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::ApiKeyMissing)?;

        if !constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
            return Err(AppError::ApiKeyInvalid);
        }
        Ok(AdminKey)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
