use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::api::{Page, PageWindow};
use crate::database::manager::DatabaseError;
use crate::database::models::Notification;
use crate::types::NotificationKind;

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, body, link, read_at, created_at";

/// Notification content shared by single and fan-out inserts
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
}

pub async fn insert(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    n: &NewNotification,
) -> Result<Notification, DatabaseError> {
    let sql = format!(
        "INSERT INTO notifications (id, user_id, kind, title, body, link) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {NOTIFICATION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Notification>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(n.kind)
        .bind(&n.title)
        .bind(n.body.as_deref())
        .bind(n.link.as_deref())
        .fetch_one(db)
        .await?;
    Ok(row)
}

/// One row per active verified user that can see content of `field`
/// (`None` = everyone), except `skip_user`. Super admins see every field;
/// a field admin only manages the field they belong to, so `u.field`
/// already covers them.
pub async fn insert_for_field_members(
    db: impl PgExecutor<'_>,
    field: Option<&str>,
    skip_user: Uuid,
    n: &NewNotification,
) -> Result<u64, DatabaseError> {
    let result = sqlx::query(
        "INSERT INTO notifications (id, user_id, kind, title, body, link) \
         SELECT gen_random_uuid(), u.id, $3, $4, $5, $6 FROM users u \
         WHERE u.is_active AND u.role <> 'unverified' AND u.id <> $2 \
           AND ($1::text IS NULL OR u.field = $1 OR u.role = 'super_admin')",
    )
    .bind(field)
    .bind(skip_user)
    .bind(n.kind)
    .bind(&n.title)
    .bind(n.body.as_deref())
    .bind(n.link.as_deref())
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// One row per attendee with status 'going'
pub async fn insert_for_event_attendees(
    db: impl PgExecutor<'_>,
    event_id: Uuid,
    n: &NewNotification,
) -> Result<u64, DatabaseError> {
    let result = sqlx::query(
        "INSERT INTO notifications (id, user_id, kind, title, body, link) \
         SELECT gen_random_uuid(), a.user_id, $2, $3, $4, $5 FROM event_attendance a \
         WHERE a.event_id = $1 AND a.status = 'going'",
    )
    .bind(event_id)
    .bind(n.kind)
    .bind(&n.title)
    .bind(n.body.as_deref())
    .bind(n.link.as_deref())
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
    unread_only: bool,
    window: PageWindow,
) -> Result<Page<Notification>, DatabaseError> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR read_at IS NULL)",
    )
    .bind(user_id)
    .bind(unread_only)
    .fetch_one(pool)
    .await?;

    let sql = format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
         WHERE user_id = $1 AND (NOT $2 OR read_at IS NULL) \
         ORDER BY created_at DESC, id LIMIT $3 OFFSET $4"
    );
    let items = sqlx::query_as::<_, Notification>(&sql)
        .bind(user_id)
        .bind(unread_only)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(pool)
        .await?;
    Ok(Page::new(items, window, total))
}

pub async fn unread_count(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<i64, DatabaseError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(count)
}

/// Returns false when the notification does not exist or belongs to someone else
pub async fn mark_read(db: impl PgExecutor<'_>, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query(
        "UPDATE notifications SET read_at = COALESCE(read_at, now()) WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<u64, DatabaseError> {
    let result = sqlx::query("UPDATE notifications SET read_at = now() WHERE user_id = $1 AND read_at IS NULL")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete(db: impl PgExecutor<'_>, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
