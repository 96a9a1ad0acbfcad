use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{Validate, validate_latitude, validate_length, validate_longitude};
use crate::error::AppError;

/// A polygon vertex.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Coordinate {
    #[schema(example = 48.8566)]
    pub latitude: f64,
    #[schema(example = 2.3522)]
    pub longitude: f64,
}

/// Create or fully replace a zone.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ZoneRequest {
    #[schema(example = "Latin Quarter")]
    pub name: String,
    /// At least three vertices, in drawing order.
    pub coordinates: Vec<Coordinate>,
}

impl Validate for ZoneRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_length("name", "Zone name", &self.name, 3, 100)?;
        if self.coordinates.len() < 3 {
            return Err(AppError::invalid_field(
                "coordinates",
                "A zone needs at least 3 coordinates",
            ));
        }
        for c in &self.coordinates {
            validate_latitude("coordinates", c.latitude)?;
            validate_longitude("coordinates", c.longitude)?;
        }
        Ok(())
    }
}

/// Back-office zone creation on behalf of a user.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreateZoneRequest {
    pub created_by_user_id: Uuid,
    #[serde(flatten)]
    pub zone: ZoneRequest,
}

impl Validate for AdminCreateZoneRequest {
    fn validate(&self) -> Result<(), AppError> {
        self.zone.validate()
    }
}

#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResponse {
    pub id: Uuid,
    pub name: String,
    pub coordinates: Vec<Coordinate>,
    pub created_by_user_id: Uuid,
    pub created_by_user_name: String,
    pub created_at: DateTime<Utc>,
}
