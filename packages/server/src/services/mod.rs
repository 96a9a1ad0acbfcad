pub mod backoffice;
pub mod pastille;
pub mod quiz;
pub mod repair;
pub mod session;
pub mod zone;

use common::storage::StorageGateway;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::warn;
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;

/// Atomically add `amount` experience points to a user.
pub async fn award_experience<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    amount: i32,
) -> Result<(), AppError> {
    let result = user::Entity::update_many()
        .col_expr(
            user::Column::Experience,
            Expr::col(user::Column::Experience).add(amount),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }
    Ok(())
}

/// Presigned URL for `key`; failures degrade to an empty URL.
pub async fn download_url(storage: &StorageGateway, key: &str) -> String {
    match storage.generate_download_url(key).await {
        Ok(url) => url,
        Err(e) => {
            warn!(key, error = %e, "Could not presign download URL");
            String::new()
        }
    }
}
