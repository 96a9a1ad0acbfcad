use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::pastille::PastilleResponse;
use super::quiz::QuizSummary;

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_pastilles: u64,
    pub total_users: u64,
    pub total_quizzes: u64,
    /// Mean of all ratings, rounded to two decimals.
    #[schema(example = 4.25)]
    pub average_rating: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub enum ActivityKind {
    PastilleCreated,
    UserRegistered,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub kind: ActivityKind,
    #[schema(example = "New pastille: Eiffel Tower")]
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserSummary {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub experience: i32,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::user::Model> for AdminUserSummary {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            experience: user.experience,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserDetail {
    #[serde(flatten)]
    pub summary: AdminUserSummary,
    pub bio: Option<String>,
    pub pastilles_count: u64,
    pub zones_count: u64,
    pub profile_picture_url: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminPastilleSummary {
    pub id: Uuid,
    pub title: String,
    pub creator_name: String,
    pub quiz_count: u64,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminPastilleDetail {
    #[serde(flatten)]
    pub pastille: PastilleResponse,
    pub quizzes: Vec<QuizSummary>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub enum RepairStatus {
    Fixed,
    Failed,
}

/// Outcome for one photo row.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairEntry {
    pub photo_id: Uuid,
    pub old_key: String,
    pub new_key: Option<String>,
    pub status: RepairStatus,
    pub error: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub scanned: usize,
    pub fixed: usize,
    pub failed: usize,
    pub results: Vec<RepairEntry>,
}
