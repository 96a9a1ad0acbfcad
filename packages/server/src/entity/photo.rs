use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photo")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Original file name. Legacy rows used it as the storage key.
    pub file_name: String,
    /// Object storage key; empty on legacy rows awaiting repair.
    pub file_key: String,

    pub pastille_id: Uuid,
    #[sea_orm(belongs_to, from = "pastille_id", to = "id", on_delete = "Cascade")]
    pub pastille: HasOne<super::pastille::Entity>,

    pub uploaded_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_resolved(&self) -> bool {
        !self.file_key.is_empty()
    }
}
