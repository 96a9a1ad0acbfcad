use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{Validate, double_option, validate_length, validate_optional_max};
use crate::entity::quiz::QuizType;
use crate::entity::{quiz, quiz_answer};
use crate::error::AppError;

const MAX_ANSWERS: usize = 10;

/// Request body for creating a quiz on a pastille.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[schema(example = "Capital city")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "Which city is this tower in?")]
    pub question_text: String,
    /// Shown after an attempt.
    pub explanation: Option<String>,
    /// `MultipleChoice`, `TrueFalse` or `FreeText`.
    #[schema(example = "MultipleChoice")]
    pub quiz_type: String,
    /// Answer texts in display order. Ignored for true/false quizzes.
    #[serde(default)]
    #[schema(example = json!(["Paris", "Lyon", "Nice"]))]
    pub answers: Vec<String>,
    /// Index of the correct answer; required for multiple-choice and true/false.
    #[schema(example = 0)]
    pub correct_answer_index: Option<usize>,
}

impl CreateQuizRequest {
    pub fn parsed_type(&self) -> Result<QuizType, AppError> {
        parse_type(&self.quiz_type)
    }
}

fn parse_type(tag: &str) -> Result<QuizType, AppError> {
    QuizType::parse(tag).ok_or_else(|| {
        AppError::invalid_field(
            "quizType",
            "Quiz type must be MultipleChoice, TrueFalse or FreeText",
        )
    })
}

fn validate_answer_texts(answers: &[String]) -> Result<(), AppError> {
    if answers.len() > MAX_ANSWERS {
        return Err(AppError::invalid_field(
            "answers",
            format!("At most {MAX_ANSWERS} answers are allowed"),
        ));
    }
    for answer in answers {
        validate_length("answers", "Answer", answer, 1, 200)?;
    }
    Ok(())
}

impl Validate for CreateQuizRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_length("title", "Title", &self.title, 1, 200)?;
        validate_length("questionText", "Question", &self.question_text, 1, 1000)?;
        validate_optional_max("description", "Description", self.description.as_deref(), 2000)?;
        validate_optional_max("explanation", "Explanation", self.explanation.as_deref(), 2000)?;
        self.parsed_type()?;
        validate_answer_texts(&self.answers)
    }
}

/// Back-office quiz creation: the pastille is named in the body.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreateQuizRequest {
    pub pastille_id: Uuid,
    #[serde(flatten)]
    pub quiz: CreateQuizRequest,
}

impl Validate for AdminCreateQuizRequest {
    fn validate(&self) -> Result<(), AppError> {
        self.quiz.validate()
    }
}

/// Partial quiz update. Sending any of `quizType`, `answers` or
/// `correctAnswerIndex` rebuilds the answer set.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub question_text: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub explanation: Option<Option<String>>,
    pub quiz_type: Option<String>,
    pub answers: Option<Vec<String>>,
    pub correct_answer_index: Option<usize>,
}

impl UpdateQuizRequest {
    pub fn parsed_type(&self) -> Result<Option<QuizType>, AppError> {
        self.quiz_type.as_deref().map(parse_type).transpose()
    }

    pub fn touches_answers(&self) -> bool {
        self.quiz_type.is_some() || self.answers.is_some() || self.correct_answer_index.is_some()
    }
}

impl Validate for UpdateQuizRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_length("title", "Title", title, 1, 200)?;
        }
        if let Some(question) = &self.question_text {
            validate_length("questionText", "Question", question, 1, 1000)?;
        }
        validate_optional_max(
            "description",
            "Description",
            self.description.as_ref().and_then(|v| v.as_deref()),
            2000,
        )?;
        validate_optional_max(
            "explanation",
            "Explanation",
            self.explanation.as_ref().and_then(|v| v.as_deref()),
            2000,
        )?;
        self.parsed_type()?;
        if let Some(answers) = &self.answers {
            validate_answer_texts(answers)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswerResponse {
    pub id: Uuid,
    #[schema(example = "Paris")]
    pub text: String,
    /// Only present in back-office responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub id: Uuid,
    pub pastille_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub question_text: String,
    /// Omitted from the public shape; revealed by attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub quiz_type: QuizType,
    pub created_at: DateTime<Utc>,
    pub answers: Vec<QuizAnswerResponse>,
}

impl QuizResponse {
    /// Shape shown to players: no correctness flags, no explanation.
    /// Free-text quizzes list no answers since the only one is the solution.
    pub fn public(quiz: quiz::Model, answers: Vec<quiz_answer::Model>) -> Self {
        let answers = match quiz.quiz_type {
            QuizType::FreeText => Vec::new(),
            _ => answers,
        };
        Self::build(quiz, answers, false)
    }

    /// Shape shown to editors.
    pub fn with_solution(quiz: quiz::Model, answers: Vec<quiz_answer::Model>) -> Self {
        Self::build(quiz, answers, true)
    }

    fn build(quiz: quiz::Model, answers: Vec<quiz_answer::Model>, reveal: bool) -> Self {
        Self {
            id: quiz.id,
            pastille_id: quiz.pastille_id,
            title: quiz.title,
            description: quiz.description,
            question_text: quiz.question_text,
            explanation: if reveal { quiz.explanation } else { None },
            quiz_type: quiz.quiz_type,
            created_at: quiz.created_at,
            answers: answers
                .into_iter()
                .map(|a| QuizAnswerResponse {
                    id: a.id,
                    text: a.answer_text,
                    is_correct: reveal.then_some(a.is_correct),
                })
                .collect(),
        }
    }
}

/// An attempt: an answer id for choice quizzes, text for free-text ones.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptRequest {
    pub selected_answer_id: Option<Uuid>,
    #[schema(example = "Paris")]
    pub answer_text: Option<String>,
}

impl Validate for QuizAttemptRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_optional_max("answerText", "Answer", self.answer_text.as_deref(), 200)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptResponse {
    pub was_correct: bool,
    #[schema(example = 25)]
    pub experience_gained: i32,
    pub correct_answer_id: Uuid,
    pub explanation: Option<String>,
}

/// Back-office quiz row.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: Uuid,
    pub pastille_id: Uuid,
    pub title: String,
    pub quiz_type: QuizType,
    pub answer_count: u64,
    pub created_at: DateTime<Utc>,
}
