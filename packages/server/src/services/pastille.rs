use std::collections::HashMap;

use chrono::Utc;
use common::storage::{StorageGateway, file_name_of};
use sea_orm::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{pastille, pastille_rating, photo, user};
use crate::error::AppError;
use crate::models::pastille::{
    CreatePastilleRequest, PastilleResponse, PhotoResponse, RatingResponse,
    UpdatePastilleRequest,
};
use crate::models::shared::normalize_optional;
use crate::utils::access::{Actor, ensure_owner};

/// Experience awarded for publishing a pastille.
pub const CREATION_XP: i32 = 50;

const KEY_TAKEN: &str = "This photo is already attached to a pastille";

pub async fn find_pastille<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<pastille::Model, AppError> {
    pastille::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Pastille not found".into()))
}

/// Presigned PUT for a key nobody holds yet.
///
/// Keys are client-chosen and visible in every photo URL, so a key already
/// referenced by a photo or already present in the bucket is refused rather
/// than letting the upload overwrite someone else's image.
pub async fn issue_upload_url<C: ConnectionTrait>(
    db: &C,
    storage: &StorageGateway,
    key: &str,
    content_type: &str,
) -> Result<String, AppError> {
    ensure_key_unclaimed(db, key, None).await?;
    if storage.exists(key).await? {
        return Err(AppError::Conflict(
            "An object with this key already exists".into(),
        ));
    }
    Ok(storage.generate_upload_url(key, content_type).await?)
}

/// Refuse `key` if a photo row other than `except` already points at it.
async fn ensure_key_unclaimed<C: ConnectionTrait>(
    db: &C,
    key: &str,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    let mut select = photo::Entity::find().filter(photo::Column::FileKey.eq(key));
    if let Some(photo_id) = except {
        select = select.filter(photo::Column::Id.ne(photo_id));
    }
    if select.count(db).await? > 0 {
        return Err(AppError::Conflict(KEY_TAKEN.into()));
    }
    Ok(())
}

// The partial unique index on photo.file_key settles concurrent claims.
fn key_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(KEY_TAKEN.into()),
        _ => AppError::from(e),
    }
}

/// Delete the object behind `key` unless another photo row still uses it.
async fn release_object(
    db: &DatabaseConnection,
    storage: &StorageGateway,
    pastille_id: Uuid,
    key: &str,
) {
    match photo::Entity::find()
        .filter(photo::Column::FileKey.eq(key))
        .count(db)
        .await
    {
        Ok(0) => {}
        Ok(_) => {
            warn!(%pastille_id, key, "Photo object still referenced elsewhere, keeping it");
            return;
        }
        Err(e) => {
            warn!(%pastille_id, key, error = %e, "Could not check photo references, keeping object");
            return;
        }
    }
    if let Err(e) = storage.delete(key).await {
        warn!(%pastille_id, key, error = %e, "Orphaned photo object");
    }
}

/// Create a pastille with its first photo and reward its author.
pub async fn create(
    db: &DatabaseConnection,
    storage: &StorageGateway,
    owner_id: Uuid,
    payload: CreatePastilleRequest,
) -> Result<PastilleResponse, AppError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let file_key = payload.file_key.trim().to_string();

    let txn = db.begin().await?;
    ensure_key_unclaimed(&txn, &file_key, None).await?;

    pastille::ActiveModel {
        id: Set(id),
        title: Set(payload.title.trim().to_string()),
        description: Set(normalize_optional(payload.description)),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        altitude: Set(payload.altitude),
        external_link: Set(normalize_optional(payload.external_link)),
        architectural_style: Set(normalize_optional(payload.architectural_style)),
        construction_period: Set(normalize_optional(payload.construction_period)),
        opening_hours: Set(normalize_optional(payload.opening_hours)),
        created_by_user_id: Set(owner_id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    photo::ActiveModel {
        id: Set(Uuid::new_v4()),
        file_name: Set(file_name_of(&file_key).to_string()),
        file_key: Set(file_key),
        pastille_id: Set(id),
        uploaded_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(key_conflict)?;

    super::award_experience(&txn, owner_id, CREATION_XP).await?;
    txn.commit().await?;

    info!(pastille_id = %id, user_id = %owner_id, "Pastille created");
    require_view(db, storage, id).await
}

/// Apply a partial update. Only the owner or an admin may do this.
pub async fn update(
    db: &DatabaseConnection,
    storage: &StorageGateway,
    actor: Actor,
    id: Uuid,
    payload: UpdatePastilleRequest,
) -> Result<PastilleResponse, AppError> {
    let txn = db.begin().await?;

    let existing = find_pastille(&txn, id).await?;
    ensure_owner(actor, existing.created_by_user_id)?;

    let mut active: pastille::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(normalize_optional(description));
    }
    if let Some(latitude) = payload.latitude {
        active.latitude = Set(latitude);
    }
    if let Some(longitude) = payload.longitude {
        active.longitude = Set(longitude);
    }
    if let Some(altitude) = payload.altitude {
        active.altitude = Set(altitude);
    }
    if let Some(link) = payload.external_link {
        active.external_link = Set(normalize_optional(link));
    }
    if let Some(style) = payload.architectural_style {
        active.architectural_style = Set(normalize_optional(style));
    }
    if let Some(period) = payload.construction_period {
        active.construction_period = Set(normalize_optional(period));
    }
    if let Some(hours) = payload.opening_hours {
        active.opening_hours = Set(normalize_optional(hours));
    }

    if active.is_changed() {
        active.update(&txn).await?;
    }
    txn.commit().await?;

    require_view(db, storage, id).await
}

/// Delete a pastille; photos, ratings and quizzes go with it.
///
/// Storage objects are removed after the rows are gone. A failed object
/// delete only leaves an orphan in the bucket and is logged.
pub async fn delete(
    db: &DatabaseConnection,
    storage: &StorageGateway,
    actor: Actor,
    id: Uuid,
) -> Result<(), AppError> {
    let txn = db.begin().await?;

    let existing = find_pastille(&txn, id).await?;
    ensure_owner(actor, existing.created_by_user_id)?;

    let photos = photo::Entity::find()
        .filter(photo::Column::PastilleId.eq(id))
        .all(&txn)
        .await?;

    pastille::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    for photo in photos.iter().filter(|p| p.is_resolved()) {
        release_object(db, storage, id, &photo.file_key).await;
    }

    info!(pastille_id = %id, photos = photos.len(), "Pastille deleted");
    Ok(())
}

/// Point the pastille's photo at a newly uploaded object.
///
/// A key held by another photo is refused before anything is touched. The
/// previous object is deleted first, unless another row still uses it; if writing the new reference then
/// fails, the pastille is left without a photo until the next replacement.
pub async fn replace_photo(
    db: &DatabaseConnection,
    storage: &StorageGateway,
    actor: Actor,
    id: Uuid,
    file_key: &str,
) -> Result<PastilleResponse, AppError> {
    let existing = find_pastille(db, id).await?;
    ensure_owner(actor, existing.created_by_user_id)?;

    let current = photo::Entity::find()
        .filter(photo::Column::PastilleId.eq(id))
        .order_by_asc(photo::Column::UploadedAt)
        .one(db)
        .await?;

    ensure_key_unclaimed(db, file_key, current.as_ref().map(|c| c.id)).await?;

    if let Some(current) = &current
        && current.is_resolved()
        && current.file_key != file_key
    {
        let shared = photo::Entity::find()
            .filter(photo::Column::FileKey.eq(current.file_key.as_str()))
            .filter(photo::Column::Id.ne(current.id))
            .count(db)
            .await?;
        if shared > 0 {
            warn!(pastille_id = %id, key = %current.file_key, "Replaced photo object still referenced elsewhere, keeping it");
        } else if let Err(e) = storage.delete(&current.file_key).await {
            warn!(pastille_id = %id, key = %current.file_key, error = %e, "Could not delete replaced photo");
        }
    }

    let now = Utc::now();
    let txn = db.begin().await?;
    match current {
        Some(current) => {
            let mut active: photo::ActiveModel = current.into();
            active.file_key = Set(file_key.to_string());
            active.file_name = Set(file_name_of(file_key).to_string());
            active.uploaded_at = Set(now);
            active.update(&txn).await.map_err(key_conflict)?;
        }
        None => {
            photo::ActiveModel {
                id: Set(Uuid::new_v4()),
                file_name: Set(file_name_of(file_key).to_string()),
                file_key: Set(file_key.to_string()),
                pastille_id: Set(id),
                uploaded_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(key_conflict)?;
        }
    }
    txn.commit().await?;

    require_view(db, storage, id).await
}

/// Record a rating. Authors cannot rate their own pastille, and each user
/// rates a pastille at most once.
pub async fn rate(
    db: &DatabaseConnection,
    rater_id: Uuid,
    id: Uuid,
    value: i32,
) -> Result<RatingResponse, AppError> {
    let txn = db.begin().await?;

    let existing = find_pastille(&txn, id).await?;
    if existing.created_by_user_id == rater_id {
        return Err(AppError::invalid_field(
            "rating",
            "You cannot rate your own pastille",
        ));
    }

    let already = pastille_rating::Entity::find()
        .filter(pastille_rating::Column::PastilleId.eq(id))
        .filter(pastille_rating::Column::RaterUserId.eq(rater_id))
        .one(&txn)
        .await?;
    if already.is_some() {
        return Err(AppError::Conflict("You have already rated this pastille".into()));
    }

    insert_rating(&txn, id, rater_id, value).await?;
    txn.commit().await?;

    let ratings = pastille_rating::Entity::find()
        .filter(pastille_rating::Column::PastilleId.eq(id))
        .all(db)
        .await?;
    Ok(RatingResponse {
        average_rating: average(&ratings),
        rating_count: ratings.len() as u64,
    })
}

/// Insert a rating row. The unique (pastille, rater) key decides
/// submissions that both passed the existence check.
pub async fn insert_rating<C: ConnectionTrait>(
    db: &C,
    pastille_id: Uuid,
    rater_id: Uuid,
    value: i32,
) -> Result<(), AppError> {
    pastille_rating::ActiveModel {
        id: Set(Uuid::new_v4()),
        pastille_id: Set(pastille_id),
        rater_user_id: Set(rater_id),
        rating_value: Set(value),
        rated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("You have already rated this pastille".into())
        }
        _ => AppError::from(e),
    })?;
    Ok(())
}

pub fn average(ratings: &[pastille_rating::Model]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let total: i64 = ratings.iter().map(|r| i64::from(r.rating_value)).sum();
    total as f64 / ratings.len() as f64
}

/// Load the public shape of one pastille, or `None` if it does not exist.
pub async fn load_view<C: ConnectionTrait>(
    db: &C,
    storage: &StorageGateway,
    id: Uuid,
) -> Result<Option<PastilleResponse>, AppError> {
    let Some(model) = pastille::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    Ok(build_views(db, storage, vec![model]).await?.pop())
}

async fn require_view(
    db: &DatabaseConnection,
    storage: &StorageGateway,
    id: Uuid,
) -> Result<PastilleResponse, AppError> {
    load_view(db, storage, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pastille not found".into()))
}

/// All pastilles, newest first, optionally restricted to one author.
pub async fn list_views<C: ConnectionTrait>(
    db: &C,
    storage: &StorageGateway,
    author: Option<Uuid>,
) -> Result<Vec<PastilleResponse>, AppError> {
    let mut select = pastille::Entity::find().order_by_desc(pastille::Column::CreatedAt);
    if let Some(author) = author {
        select = select.filter(pastille::Column::CreatedByUserId.eq(author));
    }
    let models = select.all(db).await?;
    build_views(db, storage, models).await
}

/// Attach photos, ratings and author names to a batch of pastilles.
pub async fn build_views<C: ConnectionTrait>(
    db: &C,
    storage: &StorageGateway,
    models: Vec<pastille::Model>,
) -> Result<Vec<PastilleResponse>, AppError> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = models.iter().map(|p| p.id).collect();
    let author_ids: Vec<Uuid> = models.iter().map(|p| p.created_by_user_id).collect();

    let mut photos_by_pastille: HashMap<Uuid, Vec<photo::Model>> = HashMap::new();
    for photo in photo::Entity::find()
        .filter(photo::Column::PastilleId.is_in(ids.clone()))
        .order_by_asc(photo::Column::UploadedAt)
        .all(db)
        .await?
    {
        photos_by_pastille.entry(photo.pastille_id).or_default().push(photo);
    }

    let mut ratings_by_pastille: HashMap<Uuid, Vec<pastille_rating::Model>> = HashMap::new();
    for rating in pastille_rating::Entity::find()
        .filter(pastille_rating::Column::PastilleId.is_in(ids))
        .all(db)
        .await?
    {
        ratings_by_pastille
            .entry(rating.pastille_id)
            .or_default()
            .push(rating);
    }

    let authors: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut views = Vec::with_capacity(models.len());
    for model in models {
        let photos = photos_by_pastille.remove(&model.id).unwrap_or_default();
        let ratings = ratings_by_pastille.remove(&model.id).unwrap_or_default();

        let mut photo_views = Vec::with_capacity(photos.len());
        for photo in photos {
            photo_views.push(PhotoResponse {
                id: photo.id,
                image_url: super::download_url(storage, &photo.file_key).await,
                uploaded_at: photo.uploaded_at,
            });
        }
        let photo_url = photo_views
            .iter()
            .find(|p| !p.image_url.is_empty())
            .map(|p| p.image_url.clone());

        let created_by_user_name = authors
            .get(&model.created_by_user_id)
            .map(user::Model::public_name)
            .unwrap_or_else(|| "Unknown".to_string());

        views.push(PastilleResponse {
            id: model.id,
            title: model.title,
            description: model.description,
            latitude: model.latitude,
            longitude: model.longitude,
            altitude: model.altitude,
            external_link: model.external_link,
            architectural_style: model.architectural_style,
            construction_period: model.construction_period,
            opening_hours: model.opening_hours,
            created_by_user_id: model.created_by_user_id,
            created_by_user_name,
            created_at: model.created_at,
            average_rating: average(&ratings),
            rating_count: ratings.len() as u64,
            photo_url,
            photos: photo_views,
        });
    }
    Ok(views)
}
