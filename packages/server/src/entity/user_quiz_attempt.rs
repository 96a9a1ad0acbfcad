use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_quiz_attempt")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique_key = "user_quiz")]
    pub user_id: Uuid,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Cascade")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(unique_key = "user_quiz")]
    pub quiz_id: Uuid,
    #[sea_orm(belongs_to, from = "quiz_id", to = "id", on_delete = "Cascade")]
    pub quiz: HasOne<super::quiz::Entity>,

    /// Answer chosen, or matched for free-text quizzes. Not a foreign key:
    /// answers are rewritten when a quiz is edited.
    pub selected_answer_id: Uuid,
    /// Raw text submitted to a free-text quiz.
    pub submitted_text: Option<String>,
    pub was_correct: bool,
    pub attempted_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
