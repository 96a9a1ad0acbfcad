use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Implemented by every request body; run by the `AppJson` extractor.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Generic acknowledgement body.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Operation completed")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a trimmed string's length in Unicode characters.
pub fn validate_length(
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(AppError::invalid_field(
            field,
            format!("{label} must be {min}-{max} characters"),
        ));
    }
    Ok(())
}

/// Validate an optional free-text field's maximum length.
pub fn validate_optional_max(
    field: &'static str,
    label: &str,
    value: Option<&str>,
    max: usize,
) -> Result<(), AppError> {
    if let Some(value) = value
        && value.chars().count() > max
    {
        return Err(AppError::invalid_field(
            field,
            format!("{label} must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub fn validate_latitude(field: &'static str, latitude: f64) -> Result<(), AppError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::invalid_field(
            field,
            "Latitude must be between -90 and 90",
        ));
    }
    Ok(())
}

pub fn validate_longitude(field: &'static str, longitude: f64) -> Result<(), AppError> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::invalid_field(
            field,
            "Longitude must be between -180 and 180",
        ));
    }
    Ok(())
}

/// Basic shape check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = email.len() <= 254
        && match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };
    if !valid {
        return Err(AppError::invalid_field(
            "email",
            "A valid email address is required",
        ));
    }
    Ok(())
}

pub fn validate_password(field: &'static str, password: &str) -> Result<(), AppError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::invalid_field(
            field,
            "Password must be 8-128 characters",
        ));
    }
    Ok(())
}

/// Trim an optional string, mapping blank to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Round to two decimals for display aggregates.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
