use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pastille_rating")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique_key = "pastille_rater")]
    pub pastille_id: Uuid,
    #[sea_orm(belongs_to, from = "pastille_id", to = "id", on_delete = "Cascade")]
    pub pastille: HasOne<super::pastille::Entity>,

    #[sea_orm(unique_key = "pastille_rater")]
    pub rater_user_id: Uuid,
    #[sea_orm(belongs_to, from = "rater_user_id", to = "id", on_delete = "Cascade")]
    pub user: HasOne<super::user::Entity>,

    /// 1 to 5.
    pub rating_value: i32,
    pub rated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
