use common::storage::{StorageGateway, photo_key_for};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::photo;
use crate::error::AppError;
use crate::models::backoffice::{RepairEntry, RepairReport, RepairStatus};

/// Give every photo still addressed by its legacy file name a proper key.
///
/// The object is renamed first, then the row updated. New keys derive from
/// the photo id, so a row whose object was moved by an interrupted run is
/// finished on the next one. Each row stands alone: a failure is recorded
/// in the report and the scan moves on.
pub async fn fix_photo_keys(
    db: &DatabaseConnection,
    storage: &StorageGateway,
) -> Result<RepairReport, AppError> {
    let pending = photo::Entity::find()
        .filter(photo::Column::FileKey.eq(""))
        .order_by_asc(photo::Column::UploadedAt)
        .all(db)
        .await?;

    info!(count = pending.len(), "Repairing photo keys");

    let mut results = Vec::with_capacity(pending.len());
    for row in pending {
        let entry = match repair_one(db, storage, &row).await {
            Ok(new_key) => RepairEntry {
                photo_id: row.id,
                old_key: row.file_name.clone(),
                new_key: Some(new_key),
                status: RepairStatus::Fixed,
                error: None,
            },
            Err(reason) => {
                warn!(photo_id = %row.id, file_name = %row.file_name, error = %reason, "Photo key repair failed");
                RepairEntry {
                    photo_id: row.id,
                    old_key: row.file_name.clone(),
                    new_key: None,
                    status: RepairStatus::Failed,
                    error: Some(reason),
                }
            }
        };
        results.push(entry);
    }

    let fixed = results
        .iter()
        .filter(|r| r.status == RepairStatus::Fixed)
        .count();
    let report = RepairReport {
        scanned: results.len(),
        fixed,
        failed: results.len() - fixed,
        results,
    };
    info!(scanned = report.scanned, fixed = report.fixed, failed = report.failed, "Photo key repair finished");
    Ok(report)
}

async fn repair_one(
    db: &DatabaseConnection,
    storage: &StorageGateway,
    row: &photo::Model,
) -> Result<String, String> {
    let old_key = row.file_name.trim();
    if old_key.is_empty() {
        return Err("Photo has no legacy file name".to_string());
    }

    let new_key = photo_key_for(row.id, "jpg");
    let already_moved = storage
        .exists(&new_key)
        .await
        .map_err(|e| e.to_string())?;
    if already_moved {
        // A previous run renamed the object but never recorded the key.
        info!(photo_id = %row.id, new_key = %new_key, "Photo object already under its new key");
    } else {
        storage
            .rename(old_key, &new_key)
            .await
            .map_err(|e| e.to_string())?;
    }

    let mut active: photo::ActiveModel = row.clone().into();
    active.file_key = Set(new_key.clone());
    active.update(db).await.map_err(|e| e.to_string())?;
    Ok(new_key)
}
