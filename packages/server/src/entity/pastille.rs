use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pastille")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,

    pub external_link: Option<String>,
    pub architectural_style: Option<String>,
    pub construction_period: Option<String>,
    pub opening_hours: Option<String>,

    pub created_by_user_id: Uuid,
    #[sea_orm(belongs_to, from = "created_by_user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub photos: HasMany<super::photo::Entity>,

    #[sea_orm(has_many)]
    pub ratings: HasMany<super::pastille_rating::Entity>,

    #[sea_orm(has_many)]
    pub quizzes: HasMany<super::quiz::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
