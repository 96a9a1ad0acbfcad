use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quiz_answer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub answer_text: String,
    pub is_correct: bool,
    /// Display order within the quiz, starting at 0.
    pub position: i32,

    pub quiz_id: Uuid,
    #[sea_orm(belongs_to, from = "quiz_id", to = "id", on_delete = "Cascade")]
    pub quiz: HasOne<super::quiz::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
