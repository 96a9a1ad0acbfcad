use sea_orm::entity::prelude::*;
use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};

/// Kind of question, deciding how attempts are evaluated.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum QuizType {
    /// Several answers, exactly one correct; attempts pick an answer id.
    #[sea_orm(string_value = "MultipleChoice")]
    MultipleChoice,
    /// Fixed "True"/"False" answers; attempts pick an answer id.
    #[sea_orm(string_value = "TrueFalse")]
    TrueFalse,
    /// One canonical answer; attempts submit text.
    #[sea_orm(string_value = "FreeText")]
    FreeText,
}

impl QuizType {
    /// Parse a type tag, accepting the legacy French tags older clients still send.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "multiplechoice" | "multiple_choice" | "qcm" => Some(Self::MultipleChoice),
            "truefalse" | "true_false" | "vraifaux" => Some(Self::TrueFalse),
            "freetext" | "free_text" | "textelibre" => Some(Self::FreeText),
            _ => None,
        }
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quiz")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub question_text: String,
    #[sea_orm(column_type = "Text")]
    pub explanation: Option<String>,
    pub quiz_type: QuizType,

    pub pastille_id: Uuid,
    #[sea_orm(belongs_to, from = "pastille_id", to = "id", on_delete = "Cascade")]
    pub pastille: HasOne<super::pastille::Entity>,

    #[sea_orm(has_many)]
    pub answers: HasMany<super::quiz_answer::Entity>,

    #[sea_orm(has_many)]
    pub attempts: HasMany<super::user_quiz_attempt::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
