use std::collections::HashMap;

use chrono::Utc;
use sea_orm::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{user, zone};
use crate::error::AppError;
use crate::models::zone::{Coordinate, ZoneRequest, ZoneResponse};
use crate::utils::access::{Actor, ensure_owner};

/// Decode stored vertices. Unreadable JSON reads back as an empty polygon.
pub fn parse_coordinates(zone_id: Uuid, raw: &str) -> Vec<Coordinate> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(zone_id = %zone_id, error = %e, "Stored zone coordinates are unreadable");
        Vec::new()
    })
}

fn encode_coordinates(coordinates: &[Coordinate]) -> Result<String, AppError> {
    serde_json::to_string(coordinates)
        .map_err(|e| AppError::Internal(format!("Failed to encode coordinates: {e}")))
}

pub async fn find_zone<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<zone::Model, AppError> {
    zone::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Zone not found".into()))
}

pub async fn create(
    db: &DatabaseConnection,
    owner_id: Uuid,
    payload: ZoneRequest,
) -> Result<ZoneResponse, AppError> {
    let owner = user::Entity::find_by_id(owner_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let model = zone::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        coordinates_json: Set(encode_coordinates(&payload.coordinates)?),
        created_by_user_id: Set(owner.id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(zone_id = %model.id, user_id = %owner_id, "Zone created");
    Ok(to_view(model, Some(&owner)))
}

/// Replace a zone's name and polygon.
pub async fn update(
    db: &DatabaseConnection,
    actor: Actor,
    id: Uuid,
    payload: ZoneRequest,
) -> Result<ZoneResponse, AppError> {
    let existing = find_zone(db, id).await?;
    ensure_owner(actor, existing.created_by_user_id)?;

    let mut active: zone::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.coordinates_json = Set(encode_coordinates(&payload.coordinates)?);
    active.update(db).await?;

    load_view(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Zone not found".into()))
}

pub async fn delete(db: &DatabaseConnection, actor: Actor, id: Uuid) -> Result<(), AppError> {
    let existing = find_zone(db, id).await?;
    ensure_owner(actor, existing.created_by_user_id)?;

    zone::Entity::delete_by_id(id).exec(db).await?;
    info!(zone_id = %id, "Zone deleted");
    Ok(())
}

pub async fn load_view<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<ZoneResponse>, AppError> {
    let Some(model) = zone::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    let owner = user::Entity::find_by_id(model.created_by_user_id)
        .one(db)
        .await?;
    Ok(Some(to_view(model, owner.as_ref())))
}

/// All zones, newest first.
pub async fn list_views<C: ConnectionTrait>(db: &C) -> Result<Vec<ZoneResponse>, AppError> {
    let zones = zone::Entity::find()
        .order_by_desc(zone::Column::CreatedAt)
        .all(db)
        .await?;
    let owner_ids: Vec<Uuid> = zones.iter().map(|z| z.created_by_user_id).collect();
    let owners: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(owner_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(zones
        .into_iter()
        .map(|z| {
            let owner = owners.get(&z.created_by_user_id);
            to_view(z, owner)
        })
        .collect())
}

fn to_view(model: zone::Model, owner: Option<&user::Model>) -> ZoneResponse {
    ZoneResponse {
        coordinates: parse_coordinates(model.id, &model.coordinates_json),
        id: model.id,
        name: model.name,
        created_by_user_id: model.created_by_user_id,
        created_by_user_name: owner
            .map(user::Model::public_name)
            .unwrap_or_else(|| "Unknown".to_string()),
        created_at: model.created_at,
    }
}
