use chrono::Utc;
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::entity::quiz::QuizType;
use crate::entity::{quiz, quiz_answer, user_quiz_attempt};
use crate::error::AppError;
use crate::models::quiz::{
    CreateQuizRequest, QuizAttemptRequest, QuizAttemptResponse, QuizResponse, UpdateQuizRequest,
};
use crate::models::shared::normalize_optional;
use crate::utils::access::{Actor, ensure_owner};

/// Experience awarded for a correct first attempt.
pub const CORRECT_ANSWER_XP: i32 = 25;

/// An answer before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerDraft {
    pub text: String,
    pub is_correct: bool,
}

/// Build the answer set for a quiz of the given type.
///
/// True/false quizzes always get the fixed "True" and "False" answers and
/// free-text quizzes exactly one canonical answer.
pub fn build_answers(
    quiz_type: QuizType,
    answers: &[String],
    correct_index: Option<usize>,
) -> Result<Vec<AnswerDraft>, AppError> {
    match quiz_type {
        QuizType::MultipleChoice => {
            if answers.len() < 2 {
                return Err(AppError::invalid_field(
                    "answers",
                    "A multiple-choice quiz needs at least 2 answers",
                ));
            }
            let correct = correct_index
                .filter(|i| *i < answers.len())
                .ok_or_else(|| {
                    AppError::invalid_field(
                        "correctAnswerIndex",
                        "Correct answer index must point at one of the answers",
                    )
                })?;
            Ok(answers
                .iter()
                .enumerate()
                .map(|(i, text)| AnswerDraft {
                    text: text.trim().to_string(),
                    is_correct: i == correct,
                })
                .collect())
        }
        QuizType::TrueFalse => {
            let correct = correct_index.filter(|i| *i < 2).ok_or_else(|| {
                AppError::invalid_field(
                    "correctAnswerIndex",
                    "Correct answer index must be 0 (True) or 1 (False)",
                )
            })?;
            Ok(["True", "False"]
                .iter()
                .enumerate()
                .map(|(i, text)| AnswerDraft {
                    text: ToString::to_string(&text),
                    is_correct: i == correct,
                })
                .collect())
        }
        QuizType::FreeText => match answers {
            [answer] => Ok(vec![AnswerDraft {
                text: answer.trim().to_string(),
                is_correct: true,
            }]),
            _ => Err(AppError::invalid_field(
                "answers",
                "A free-text quiz needs exactly one expected answer",
            )),
        },
    }
}

/// Outcome of checking one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub was_correct: bool,
    /// Answer recorded against the attempt.
    pub recorded_answer_id: Uuid,
    pub correct_answer_id: Uuid,
}

/// Check an attempt against the stored answers.
pub fn evaluate(
    quiz_type: QuizType,
    answers: &[quiz_answer::Model],
    attempt: &QuizAttemptRequest,
) -> Result<Evaluation, AppError> {
    let correct = answers
        .iter()
        .find(|a| a.is_correct)
        .ok_or_else(|| AppError::Internal("Quiz has no correct answer".into()))?;

    match quiz_type {
        QuizType::MultipleChoice | QuizType::TrueFalse => {
            let selected = attempt.selected_answer_id.ok_or_else(|| {
                AppError::invalid_field("selectedAnswerId", "An answer must be selected")
            })?;
            let chosen = answers.iter().find(|a| a.id == selected).ok_or_else(|| {
                AppError::invalid_field(
                    "selectedAnswerId",
                    "Selected answer does not belong to this quiz",
                )
            })?;
            Ok(Evaluation {
                was_correct: chosen.is_correct,
                recorded_answer_id: chosen.id,
                correct_answer_id: correct.id,
            })
        }
        QuizType::FreeText => {
            let text = attempt
                .answer_text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| AppError::invalid_field("answerText", "An answer is required"))?;
            Ok(Evaluation {
                was_correct: text.to_lowercase() == correct.answer_text.trim().to_lowercase(),
                recorded_answer_id: correct.id,
                correct_answer_id: correct.id,
            })
        }
    }
}

pub async fn find_quiz<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<quiz::Model, AppError> {
    quiz::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".into()))
}

/// Answers of a quiz in display order.
pub async fn load_answers<C: ConnectionTrait>(
    db: &C,
    quiz_id: Uuid,
) -> Result<Vec<quiz_answer::Model>, AppError> {
    Ok(quiz_answer::Entity::find()
        .filter(quiz_answer::Column::QuizId.eq(quiz_id))
        .order_by_asc(quiz_answer::Column::Position)
        .all(db)
        .await?)
}

/// A quiz with its answers, which must belong to `pastille_id` when given.
pub async fn load<C: ConnectionTrait>(
    db: &C,
    pastille_id: Option<Uuid>,
    quiz_id: Uuid,
) -> Result<(quiz::Model, Vec<quiz_answer::Model>), AppError> {
    let quiz = find_quiz(db, quiz_id).await?;
    if pastille_id.is_some_and(|p| p != quiz.pastille_id) {
        return Err(AppError::NotFound("Quiz not found".into()));
    }
    let answers = load_answers(db, quiz.id).await?;
    Ok((quiz, answers))
}

/// All quizzes of a pastille, oldest first, with answers.
pub async fn list_for_pastille<C: ConnectionTrait>(
    db: &C,
    pastille_id: Uuid,
) -> Result<Vec<(quiz::Model, Vec<quiz_answer::Model>)>, AppError> {
    let quizzes = quiz::Entity::find()
        .filter(quiz::Column::PastilleId.eq(pastille_id))
        .order_by_asc(quiz::Column::CreatedAt)
        .all(db)
        .await?;
    let ids: Vec<Uuid> = quizzes.iter().map(|q| q.id).collect();
    let mut answers = quiz_answer::Entity::find()
        .filter(quiz_answer::Column::QuizId.is_in(ids))
        .order_by_asc(quiz_answer::Column::Position)
        .all(db)
        .await?;

    Ok(quizzes
        .into_iter()
        .map(|q| {
            let (mine, rest): (Vec<_>, Vec<_>) =
                answers.drain(..).partition(|a| a.quiz_id == q.id);
            answers = rest;
            (q, mine)
        })
        .collect())
}

async fn insert_answers<C: ConnectionTrait>(
    db: &C,
    quiz_id: Uuid,
    drafts: Vec<AnswerDraft>,
) -> Result<(), AppError> {
    for (position, draft) in drafts.into_iter().enumerate() {
        quiz_answer::ActiveModel {
            id: Set(Uuid::new_v4()),
            answer_text: Set(draft.text),
            is_correct: Set(draft.is_correct),
            position: Set(position as i32),
            quiz_id: Set(quiz_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Create a quiz on a pastille owned by `actor`.
pub async fn create(
    db: &DatabaseConnection,
    actor: Actor,
    pastille_id: Uuid,
    payload: CreateQuizRequest,
) -> Result<QuizResponse, AppError> {
    let quiz_type = payload.parsed_type()?;
    let drafts = build_answers(quiz_type, &payload.answers, payload.correct_answer_index)?;

    let txn = db.begin().await?;
    let pastille = super::pastille::find_pastille(&txn, pastille_id).await?;
    ensure_owner(actor, pastille.created_by_user_id)?;

    let id = Uuid::new_v4();
    quiz::ActiveModel {
        id: Set(id),
        title: Set(payload.title.trim().to_string()),
        description: Set(normalize_optional(payload.description)),
        question_text: Set(payload.question_text.trim().to_string()),
        explanation: Set(normalize_optional(payload.explanation)),
        quiz_type: Set(quiz_type),
        pastille_id: Set(pastille_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    insert_answers(&txn, id, drafts).await?;

    let (quiz, answers) = load(&txn, Some(pastille_id), id).await?;
    txn.commit().await?;

    info!(quiz_id = %id, pastille_id = %pastille_id, "Quiz created");
    Ok(QuizResponse::with_solution(quiz, answers))
}

/// Partial quiz update. Touching the type or answers replaces the whole
/// answer set; stored attempts keep their recorded outcome.
pub async fn update(
    db: &DatabaseConnection,
    actor: Actor,
    pastille_id: Option<Uuid>,
    quiz_id: Uuid,
    payload: UpdateQuizRequest,
) -> Result<QuizResponse, AppError> {
    let txn = db.begin().await?;

    let (existing, current_answers) = load(&txn, pastille_id, quiz_id).await?;
    let pastille = super::pastille::find_pastille(&txn, existing.pastille_id).await?;
    ensure_owner(actor, pastille.created_by_user_id)?;

    let drafts = if payload.touches_answers() {
        let quiz_type = payload.parsed_type()?.unwrap_or(existing.quiz_type);
        let texts = match &payload.answers {
            Some(texts) => texts.clone(),
            None => current_answers.iter().map(|a| a.answer_text.clone()).collect(),
        };
        let correct_index = payload
            .correct_answer_index
            .or_else(|| current_answers.iter().position(|a| a.is_correct));
        Some((quiz_type, build_answers(quiz_type, &texts, correct_index)?))
    } else {
        None
    };

    let mut active: quiz::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(normalize_optional(description));
    }
    if let Some(question) = payload.question_text {
        active.question_text = Set(question.trim().to_string());
    }
    if let Some(explanation) = payload.explanation {
        active.explanation = Set(normalize_optional(explanation));
    }
    if let Some((quiz_type, _)) = &drafts {
        active.quiz_type = Set(*quiz_type);
    }
    if active.is_changed() {
        active.update(&txn).await?;
    }

    if let Some((_, drafts)) = drafts {
        quiz_answer::Entity::delete_many()
            .filter(quiz_answer::Column::QuizId.eq(quiz_id))
            .exec(&txn)
            .await?;
        insert_answers(&txn, quiz_id, drafts).await?;
    }

    let (quiz, answers) = load(&txn, None, quiz_id).await?;
    txn.commit().await?;
    Ok(QuizResponse::with_solution(quiz, answers))
}

pub async fn delete(
    db: &DatabaseConnection,
    actor: Actor,
    pastille_id: Option<Uuid>,
    quiz_id: Uuid,
) -> Result<(), AppError> {
    let txn = db.begin().await?;

    let existing = find_quiz(&txn, quiz_id).await?;
    if pastille_id.is_some_and(|p| p != existing.pastille_id) {
        return Err(AppError::NotFound("Quiz not found".into()));
    }
    let pastille = super::pastille::find_pastille(&txn, existing.pastille_id).await?;
    ensure_owner(actor, pastille.created_by_user_id)?;

    quiz::Entity::delete_by_id(quiz_id).exec(&txn).await?;
    txn.commit().await?;

    info!(quiz_id = %quiz_id, "Quiz deleted");
    Ok(())
}

/// Record a user's single attempt at a quiz.
pub async fn attempt(
    db: &DatabaseConnection,
    user_id: Uuid,
    pastille_id: Uuid,
    quiz_id: Uuid,
    payload: &QuizAttemptRequest,
) -> Result<QuizAttemptResponse, AppError> {
    let txn = db.begin().await?;

    let (quiz, answers) = load(&txn, Some(pastille_id), quiz_id).await?;

    let previous = user_quiz_attempt::Entity::find()
        .filter(user_quiz_attempt::Column::UserId.eq(user_id))
        .filter(user_quiz_attempt::Column::QuizId.eq(quiz_id))
        .one(&txn)
        .await?;
    if previous.is_some() {
        return Err(AppError::Conflict("You have already answered this quiz".into()));
    }

    let outcome = evaluate(quiz.quiz_type, &answers, payload)?;

    insert_attempt(
        &txn,
        user_quiz_attempt::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            quiz_id: Set(quiz_id),
            selected_answer_id: Set(outcome.recorded_answer_id),
            submitted_text: Set(match quiz.quiz_type {
                QuizType::FreeText => normalize_optional(payload.answer_text.clone()),
                _ => None,
            }),
            was_correct: Set(outcome.was_correct),
            attempted_at: Set(Utc::now()),
            ..Default::default()
        },
    )
    .await?;

    let experience_gained = if outcome.was_correct {
        super::award_experience(&txn, user_id, CORRECT_ANSWER_XP).await?;
        CORRECT_ANSWER_XP
    } else {
        0
    };
    txn.commit().await?;

    info!(
        quiz_id = %quiz_id,
        user_id = %user_id,
        was_correct = outcome.was_correct,
        "Quiz attempted"
    );
    Ok(QuizAttemptResponse {
        was_correct: outcome.was_correct,
        experience_gained,
        correct_answer_id: outcome.correct_answer_id,
        explanation: quiz.explanation,
    })
}

/// Insert an attempt row. The unique (user, quiz) key decides attempts
/// that both passed the existence check.
pub async fn insert_attempt<C: ConnectionTrait>(
    db: &C,
    attempt: user_quiz_attempt::ActiveModel,
) -> Result<(), AppError> {
    attempt.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("You have already answered this quiz".into())
        }
        _ => AppError::from(e),
    })?;
    Ok(())
}
