use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::api::{Page, PageWindow};
use crate::database::manager::DatabaseError;
use crate::database::models::{Submission, SubmissionWithUser};
use crate::types::SubmissionStatus;

const SUBMISSION_COLUMNS: &str = "s.id, s.user_id, s.field, s.batch_year, s.roll_number, s.note, s.status, \
     s.reviewed_by, s.review_note, s.created_at, s.reviewed_at";

pub struct NewSubmission<'a> {
    pub user_id: Uuid,
    pub field: &'a str,
    pub batch_year: i32,
    pub roll_number: &'a str,
    pub note: Option<&'a str>,
}

pub async fn insert(db: impl PgExecutor<'_>, new: NewSubmission<'_>) -> Result<Submission, DatabaseError> {
    let sql = format!(
        "INSERT INTO submissions AS s (id, user_id, field, batch_year, roll_number, note) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SUBMISSION_COLUMNS}"
    );
    let submission = sqlx::query_as::<_, Submission>(&sql)
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.field)
        .bind(new.batch_year)
        .bind(new.roll_number)
        .bind(new.note)
        .fetch_one(db)
        .await?;
    Ok(submission)
}

pub async fn list_for_user(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<Vec<Submission>, DatabaseError> {
    let sql = format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions s WHERE s.user_id = $1 ORDER BY s.created_at DESC"
    );
    let rows = sqlx::query_as::<_, Submission>(&sql).bind(user_id).fetch_all(db).await?;
    Ok(rows)
}

/// Lock a submission row for review
pub async fn find_for_update(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Submission>, DatabaseError> {
    let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions s WHERE s.id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, Submission>(&sql).bind(id).fetch_optional(db).await?;
    Ok(row)
}

pub async fn record_review(
    db: impl PgExecutor<'_>,
    id: Uuid,
    status: SubmissionStatus,
    reviewer: Uuid,
    note: Option<&str>,
) -> Result<Submission, DatabaseError> {
    let sql = format!(
        "UPDATE submissions AS s SET status = $2, reviewed_by = $3, review_note = $4, reviewed_at = now() \
         WHERE s.id = $1 RETURNING {SUBMISSION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Submission>(&sql)
        .bind(id)
        .bind(status)
        .bind(reviewer)
        .bind(note)
        .fetch_one(db)
        .await?;
    Ok(row)
}

/// Review queue. `field` restricts to one field; `None` means every field.
pub async fn list_for_review(
    pool: &PgPool,
    field: Option<&str>,
    status: Option<SubmissionStatus>,
    window: PageWindow,
) -> Result<Page<SubmissionWithUser>, DatabaseError> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM submissions s \
         WHERE ($1::text IS NULL OR s.field = $1) AND ($2::text IS NULL OR s.status = $2)",
    )
    .bind(field)
    .bind(status)
    .fetch_one(pool)
    .await?;

    let sql = format!(
        "SELECT {SUBMISSION_COLUMNS}, u.name AS user_name, u.email AS user_email \
         FROM submissions s JOIN users u ON u.id = s.user_id \
         WHERE ($1::text IS NULL OR s.field = $1) AND ($2::text IS NULL OR s.status = $2) \
         ORDER BY s.created_at ASC LIMIT $3 OFFSET $4"
    );
    let items = sqlx::query_as::<_, SubmissionWithUser>(&sql)
        .bind(field)
        .bind(status)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(pool)
        .await?;
    Ok(Page::new(items, window, total))
}
