use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::SubmissionStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub field: String,
    pub batch_year: i32,
    pub roll_number: String,
    pub note: Option<String>,
    pub status: SubmissionStatus,
    pub reviewed_by: Option<Uuid>,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Submission as shown to reviewers
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubmissionWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub submission: Submission,
    pub user_name: String,
    pub user_email: String,
}
