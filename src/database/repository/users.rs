use sqlx::PgExecutor;
use uuid::Uuid;

use crate::api::{Page, PageWindow};
use crate::database::manager::DatabaseError;
use crate::database::models::user::USER_COLUMNS;
use crate::database::models::{DirectoryEntry, User};
use crate::database::query_builder::DirectoryQuery;
use crate::types::Role;

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub field: Option<&'a str>,
    pub batch_year: Option<i32>,
}

pub async fn insert(db: impl PgExecutor<'_>, new_user: NewUser<'_>) -> Result<User, DatabaseError> {
    let sql = format!(
        "INSERT INTO users (id, name, email, password_hash, role, field, batch_year) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(Uuid::new_v4())
        .bind(new_user.name)
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.role)
        .bind(new_user.field)
        .bind(new_user.batch_year)
        .fetch_one(db)
        .await?;
    Ok(user)
}

pub async fn find_by_id(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(db).await?;
    Ok(user)
}

/// Same as `find_by_id` but takes a row lock for the rest of the transaction
pub async fn find_by_id_for_update(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
    let user = sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(db).await?;
    Ok(user)
}

pub async fn find_by_email(db: impl PgExecutor<'_>, email: &str) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
    let user = sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(db).await?;
    Ok(user)
}

pub async fn update_role(db: impl PgExecutor<'_>, id: Uuid, role: Role) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE users SET role = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(role)
        .execute(db)
        .await?;
    Ok(())
}

/// Promote an unverified user after an approved submission, recording field and batch
pub async fn mark_verified(
    db: impl PgExecutor<'_>,
    id: Uuid,
    field: &str,
    batch_year: i32,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "UPDATE users SET field = $2, batch_year = $3, \
         role = CASE WHEN role = 'unverified' THEN 'alumni' ELSE role END, \
         updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(field)
    .bind(batch_year)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn update_name(db: impl PgExecutor<'_>, id: Uuid, name: &str) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE users SET name = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(name)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn update_password(db: impl PgExecutor<'_>, id: Uuid, password_hash: &str) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn set_active(db: impl PgExecutor<'_>, id: Uuid, active: bool) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE users SET is_active = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(active)
        .execute(db)
        .await?;
    Ok(())
}

/// Paged directory listing; runs a count and a page query against the pool
pub async fn search(
    pool: &sqlx::PgPool,
    query: &DirectoryQuery,
    window: PageWindow,
) -> Result<Page<DirectoryEntry>, DatabaseError> {
    let total: i64 = query.count().build_query_scalar().fetch_one(pool).await?;
    let items = query
        .select(window)
        .build_query_as::<DirectoryEntry>()
        .fetch_all(pool)
        .await?;
    Ok(Page::new(items, window, total))
}
