use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::api::{Page, PageWindow};
use crate::database::manager::DatabaseError;
use crate::database::models::{Event, EventSummary};

const EVENT_COLUMNS: &str = "e.id, e.title, e.description, e.location, e.starts_at, e.ends_at, e.field, \
     e.capacity, e.created_by, e.is_cancelled, e.created_at, e.updated_at";

const GOING_COUNT: &str =
    "(SELECT COUNT(*) FROM event_attendance a WHERE a.event_id = e.id AND a.status = 'going') AS going_count";

pub struct NewEvent<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub field: Option<&'a str>,
    pub capacity: Option<i32>,
    pub created_by: Uuid,
}

/// Updated values; `None` keeps the stored value
#[derive(Debug, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
}

/// Which events a listing may return
#[derive(Debug, Clone, Default)]
pub struct EventVisibility {
    /// Field of the viewer; field-scoped events of other fields are hidden
    pub viewer_field: Option<String>,
    /// Field the viewer administers; its events are visible too
    pub managed_field: Option<String>,
    /// Super admins see every field
    pub all_fields: bool,
    pub only_field: Option<String>,
    pub upcoming_only: bool,
    pub include_cancelled: bool,
}

pub async fn insert(db: impl PgExecutor<'_>, new: NewEvent<'_>) -> Result<Event, DatabaseError> {
    let sql = format!(
        "INSERT INTO events AS e (id, title, description, location, starts_at, ends_at, field, capacity, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {EVENT_COLUMNS}"
    );
    let event = sqlx::query_as::<_, Event>(&sql)
        .bind(Uuid::new_v4())
        .bind(new.title)
        .bind(new.description)
        .bind(new.location)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .bind(new.field)
        .bind(new.capacity)
        .bind(new.created_by)
        .fetch_one(db)
        .await?;
    Ok(event)
}

pub async fn find(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Event>, DatabaseError> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = $1");
    let event = sqlx::query_as::<_, Event>(&sql).bind(id).fetch_optional(db).await?;
    Ok(event)
}

/// Locks the event row; serializes capacity checks for concurrent RSVPs
pub async fn find_for_update(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Event>, DatabaseError> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = $1 FOR UPDATE");
    let event = sqlx::query_as::<_, Event>(&sql).bind(id).fetch_optional(db).await?;
    Ok(event)
}

pub async fn find_summary(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<EventSummary>, DatabaseError> {
    let sql = format!("SELECT {EVENT_COLUMNS}, {GOING_COUNT} FROM events e WHERE e.id = $1");
    let event = sqlx::query_as::<_, EventSummary>(&sql).bind(id).fetch_optional(db).await?;
    Ok(event)
}

pub async fn update(db: impl PgExecutor<'_>, id: Uuid, changes: EventChanges) -> Result<Event, DatabaseError> {
    let sql = format!(
        "UPDATE events AS e SET \
            title = COALESCE($2, e.title), \
            description = COALESCE($3, e.description), \
            location = COALESCE($4, e.location), \
            starts_at = COALESCE($5, e.starts_at), \
            ends_at = COALESCE($6, e.ends_at), \
            capacity = COALESCE($7, e.capacity), \
            updated_at = now() \
         WHERE e.id = $1 RETURNING {EVENT_COLUMNS}"
    );
    let event = sqlx::query_as::<_, Event>(&sql)
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.location)
        .bind(changes.starts_at)
        .bind(changes.ends_at)
        .bind(changes.capacity)
        .fetch_one(db)
        .await?;
    Ok(event)
}

pub async fn cancel(db: impl PgExecutor<'_>, id: Uuid) -> Result<Event, DatabaseError> {
    let sql = format!(
        "UPDATE events AS e SET is_cancelled = true, updated_at = now() WHERE e.id = $1 RETURNING {EVENT_COLUMNS}"
    );
    let event = sqlx::query_as::<_, Event>(&sql).bind(id).fetch_one(db).await?;
    Ok(event)
}

pub async fn list(
    pool: &PgPool,
    visibility: &EventVisibility,
    window: PageWindow,
) -> Result<Page<EventSummary>, DatabaseError> {
    // $1 all_fields, $2 viewer_field, $3 only_field, $4 upcoming_only, $5 include_cancelled, $6 managed_field
    const FILTER: &str = "($1 OR e.field IS NULL OR e.field = $2 OR e.field = $6) \
         AND ($3::text IS NULL OR e.field = $3) \
         AND (NOT $4 OR e.starts_at >= now()) \
         AND ($5 OR NOT e.is_cancelled)";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM events e WHERE {FILTER}"))
        .bind(visibility.all_fields)
        .bind(visibility.viewer_field.as_deref())
        .bind(visibility.only_field.as_deref())
        .bind(visibility.upcoming_only)
        .bind(visibility.include_cancelled)
        .bind(visibility.managed_field.as_deref())
        .fetch_one(pool)
        .await?;

    let sql = format!(
        "SELECT {EVENT_COLUMNS}, {GOING_COUNT} FROM events e WHERE {FILTER} \
         ORDER BY e.starts_at ASC, e.id ASC LIMIT $7 OFFSET $8"
    );
    let items = sqlx::query_as::<_, EventSummary>(&sql)
        .bind(visibility.all_fields)
        .bind(visibility.viewer_field.as_deref())
        .bind(visibility.only_field.as_deref())
        .bind(visibility.upcoming_only)
        .bind(visibility.include_cancelled)
        .bind(visibility.managed_field.as_deref())
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(pool)
        .await?;
    Ok(Page::new(items, window, total))
}
