use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Attendance, Attendee};
use crate::types::AttendanceStatus;

pub async fn find(db: impl PgExecutor<'_>, event_id: Uuid, user_id: Uuid) -> Result<Option<Attendance>, DatabaseError> {
    let row = sqlx::query_as::<_, Attendance>(
        "SELECT event_id, user_id, status, responded_at FROM event_attendance WHERE event_id = $1 AND user_id = $2",
    )
    .bind(event_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn count_going(db: impl PgExecutor<'_>, event_id: Uuid) -> Result<i64, DatabaseError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM event_attendance WHERE event_id = $1 AND status = 'going'",
    )
    .bind(event_id)
    .fetch_one(db)
    .await?;
    Ok(count)
}

/// Number of responses per status; statuses nobody chose are absent
pub async fn count_by_status(
    db: impl PgExecutor<'_>,
    event_id: Uuid,
) -> Result<Vec<(AttendanceStatus, i64)>, DatabaseError> {
    let rows: Vec<(AttendanceStatus, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM event_attendance WHERE event_id = $1 GROUP BY status",
    )
    .bind(event_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn upsert(
    db: impl PgExecutor<'_>,
    event_id: Uuid,
    user_id: Uuid,
    status: AttendanceStatus,
) -> Result<Attendance, DatabaseError> {
    let row = sqlx::query_as::<_, Attendance>(
        "INSERT INTO event_attendance (event_id, user_id, status) VALUES ($1, $2, $3) \
         ON CONFLICT (event_id, user_id) DO UPDATE SET status = EXCLUDED.status, responded_at = now() \
         RETURNING event_id, user_id, status, responded_at",
    )
    .bind(event_id)
    .bind(user_id)
    .bind(status)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: impl PgExecutor<'_>, event_id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM event_attendance WHERE event_id = $1 AND user_id = $2")
        .bind(event_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_attendees(db: impl PgExecutor<'_>, event_id: Uuid) -> Result<Vec<Attendee>, DatabaseError> {
    let rows = sqlx::query_as::<_, Attendee>(
        "SELECT a.user_id, u.name, u.email, a.status, a.responded_at \
         FROM event_attendance a JOIN users u ON u.id = a.user_id \
         WHERE a.event_id = $1 ORDER BY a.status, u.name",
    )
    .bind(event_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
