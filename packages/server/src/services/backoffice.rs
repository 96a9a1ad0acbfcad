use std::collections::HashMap;

use common::storage::StorageGateway;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{pastille, pastille_rating, quiz, quiz_answer, user, zone};
use crate::error::AppError;
use crate::models::backoffice::{
    ActivityKind, AdminPastilleDetail, AdminPastilleSummary, AdminUserDetail, AdminUserSummary,
    DashboardStats, RecentActivity,
};
use crate::models::quiz::QuizSummary;
use crate::models::shared::round2;

/// Entries taken from each activity source.
const ACTIVITY_PER_SOURCE: u64 = 5;

pub async fn dashboard_stats(db: &DatabaseConnection) -> Result<DashboardStats, AppError> {
    let total_pastilles = pastille::Entity::find().count(db).await?;
    let total_users = user::Entity::find().count(db).await?;
    let total_quizzes = quiz::Entity::find().count(db).await?;

    let rating_count = pastille_rating::Entity::find().count(db).await?;
    let rating_sum: Option<i64> = pastille_rating::Entity::find()
        .select_only()
        .column_as(
            Expr::expr(Func::sum(Expr::col(pastille_rating::Column::RatingValue))),
            "total",
        )
        .into_tuple::<Option<i64>>()
        .one(db)
        .await?
        .flatten();

    let average_rating = match (rating_sum, rating_count) {
        (Some(sum), count) if count > 0 => round2(sum as f64 / count as f64),
        _ => 0.0,
    };

    Ok(DashboardStats {
        total_pastilles,
        total_users,
        total_quizzes,
        average_rating,
    })
}

/// Latest pastilles and registrations, merged newest first.
pub async fn recent_activities(db: &DatabaseConnection) -> Result<Vec<RecentActivity>, AppError> {
    let pastilles = pastille::Entity::find()
        .order_by_desc(pastille::Column::CreatedAt)
        .limit(ACTIVITY_PER_SOURCE)
        .all(db)
        .await?;
    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .limit(ACTIVITY_PER_SOURCE)
        .all(db)
        .await?;

    let mut activities: Vec<RecentActivity> = pastilles
        .into_iter()
        .map(|p| RecentActivity {
            kind: ActivityKind::PastilleCreated,
            description: format!("New pastille: {}", p.title),
            occurred_at: p.created_at,
        })
        .chain(users.into_iter().map(|u| RecentActivity {
            kind: ActivityKind::UserRegistered,
            description: format!("New user: {}", u.public_name()),
            occurred_at: u.created_at,
        }))
        .collect();

    activities.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    Ok(activities)
}

pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<AdminUserSummary>, AppError> {
    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(users.into_iter().map(AdminUserSummary::from).collect())
}

async fn find_user(db: &DatabaseConnection, id: Uuid) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn user_detail(
    db: &DatabaseConnection,
    storage: &StorageGateway,
    id: Uuid,
) -> Result<AdminUserDetail, AppError> {
    let user = find_user(db, id).await?;

    let pastilles_count = pastille::Entity::find()
        .filter(pastille::Column::CreatedByUserId.eq(id))
        .count(db)
        .await?;
    let zones_count = zone::Entity::find()
        .filter(zone::Column::CreatedByUserId.eq(id))
        .count(db)
        .await?;
    let profile_picture_url = match user.avatar_key.as_deref() {
        Some(key) => Some(super::download_url(storage, key).await),
        None => None,
    };

    Ok(AdminUserDetail {
        bio: user.bio.clone(),
        summary: AdminUserSummary::from(user),
        pastilles_count,
        zones_count,
        profile_picture_url,
    })
}

/// Delete a user who owns no content. Ratings and quiz attempts go with them.
pub async fn delete_user(
    db: &DatabaseConnection,
    storage: &StorageGateway,
    id: Uuid,
) -> Result<(), AppError> {
    let txn = db.begin().await?;

    let user = user::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let owns_pastilles = pastille::Entity::find()
        .filter(pastille::Column::CreatedByUserId.eq(id))
        .count(&txn)
        .await?
        > 0;
    let owns_zones = zone::Entity::find()
        .filter(zone::Column::CreatedByUserId.eq(id))
        .count(&txn)
        .await?
        > 0;
    if owns_pastilles || owns_zones {
        return Err(AppError::Conflict(
            "User still owns pastilles or zones".into(),
        ));
    }

    user::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            // Content created between the check and the delete.
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                AppError::Conflict("User still owns pastilles or zones".into())
            }
            _ => AppError::from(e),
        })?;
    txn.commit().await?;

    if let Some(key) = user.avatar_key.as_deref()
        && let Err(e) = storage.delete(key).await
    {
        warn!(user_id = %id, key, error = %e, "Orphaned profile picture after user delete");
    }

    info!(user_id = %id, "User deleted from back office");
    Ok(())
}

pub async fn list_pastilles(
    db: &DatabaseConnection,
    storage: &StorageGateway,
) -> Result<Vec<AdminPastilleSummary>, AppError> {
    let views = super::pastille::list_views(db, storage, None).await?;

    let mut quiz_counts: HashMap<Uuid, u64> = HashMap::new();
    for pastille_id in quiz::Entity::find()
        .select_only()
        .column(quiz::Column::PastilleId)
        .into_tuple::<Uuid>()
        .all(db)
        .await?
    {
        *quiz_counts.entry(pastille_id).or_default() += 1;
    }

    Ok(views
        .into_iter()
        .map(|view| AdminPastilleSummary {
            quiz_count: quiz_counts.get(&view.id).copied().unwrap_or(0),
            id: view.id,
            title: view.title,
            creator_name: view.created_by_user_name,
            average_rating: round2(view.average_rating),
            created_at: view.created_at,
        })
        .collect())
}

pub async fn pastille_detail(
    db: &DatabaseConnection,
    storage: &StorageGateway,
    id: Uuid,
) -> Result<AdminPastilleDetail, AppError> {
    let pastille = super::pastille::load_view(db, storage, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pastille not found".into()))?;
    let quizzes = super::quiz::list_for_pastille(db, id)
        .await?
        .into_iter()
        .map(|(quiz, answers)| summarize_quiz(quiz, answers.len() as u64))
        .collect();

    Ok(AdminPastilleDetail { pastille, quizzes })
}

/// Every quiz, newest first, with its answer count.
pub async fn list_quizzes(db: &DatabaseConnection) -> Result<Vec<QuizSummary>, AppError> {
    let quizzes = quiz::Entity::find()
        .order_by_desc(quiz::Column::CreatedAt)
        .all(db)
        .await?;

    let mut answer_counts: HashMap<Uuid, u64> = HashMap::new();
    for quiz_id in quiz_answer::Entity::find()
        .select_only()
        .column(quiz_answer::Column::QuizId)
        .into_tuple::<Uuid>()
        .all(db)
        .await?
    {
        *answer_counts.entry(quiz_id).or_default() += 1;
    }

    Ok(quizzes
        .into_iter()
        .map(|q| {
            let count = answer_counts.get(&q.id).copied().unwrap_or(0);
            summarize_quiz(q, count)
        })
        .collect())
}

fn summarize_quiz(quiz: quiz::Model, answer_count: u64) -> QuizSummary {
    QuizSummary {
        id: quiz.id,
        pastille_id: quiz.pastille_id,
        title: quiz.title,
        quiz_type: quiz.quiz_type,
        answer_count,
        created_at: quiz.created_at,
    }
}
