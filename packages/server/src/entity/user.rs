use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Stored lower-cased.
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    #[sea_orm(column_type = "Text")]
    pub bio: Option<String>,
    /// Only ever incremented.
    pub experience: i32,
    pub avatar_key: Option<String>,

    #[sea_orm(unique)]
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTimeUtc>,

    /// SHA-256 hex digest of the outstanding password reset token.
    pub password_reset_hash: Option<String>,
    pub password_reset_expires_at: Option<DateTimeUtc>,

    #[sea_orm(has_many)]
    pub pastilles: HasMany<super::pastille::Entity>,

    #[sea_orm(has_many)]
    pub zones: HasMany<super::zone::Entity>,

    #[sea_orm(has_many)]
    pub ratings: HasMany<super::pastille_rating::Entity>,

    #[sea_orm(has_many)]
    pub quiz_attempts: HasMany<super::user_quiz_attempt::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Name shown to other users: the display name, else the email's local part.
    pub fn public_name(&self) -> String {
        public_name(&self.display_name, &self.email)
    }
}

pub fn public_name(display_name: &str, email: &str) -> String {
    let name = display_name.trim();
    if !name.is_empty() {
        return name.to_string();
    }
    match email.split_once('@') {
        Some((local, _)) if !local.is_empty() => local.to_string(),
        _ => "Unknown".to_string(),
    }
}
