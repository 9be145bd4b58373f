use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{FieldAdmin, FieldAdminView};

const FIELD_ADMIN_COLUMNS: &str =
    "fa.id, fa.field, fa.user_id, fa.is_active, fa.assigned_by, fa.assigned_at, fa.deactivated_at";

/// Lock the active assignment of a field, if any
pub async fn find_active_for_update(db: impl PgExecutor<'_>, field: &str) -> Result<Option<FieldAdmin>, DatabaseError> {
    let sql = format!(
        "SELECT {FIELD_ADMIN_COLUMNS} FROM field_admins fa WHERE fa.field = $1 AND fa.is_active FOR UPDATE"
    );
    let row = sqlx::query_as::<_, FieldAdmin>(&sql).bind(field).fetch_optional(db).await?;
    Ok(row)
}

/// Lock every active assignment held by a user
pub async fn lock_active_for_user(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<Vec<FieldAdmin>, DatabaseError> {
    let sql = format!(
        "SELECT {FIELD_ADMIN_COLUMNS} FROM field_admins fa WHERE fa.user_id = $1 AND fa.is_active \
         ORDER BY fa.field FOR UPDATE"
    );
    let rows = sqlx::query_as::<_, FieldAdmin>(&sql).bind(user_id).fetch_all(db).await?;
    Ok(rows)
}

/// Field the user currently administers, if any
pub async fn active_field_for_user(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<Option<String>, DatabaseError> {
    let field: Option<String> = sqlx::query_scalar(
        "SELECT field FROM field_admins WHERE user_id = $1 AND is_active ORDER BY assigned_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(field)
}

pub async fn active_admin_of(db: impl PgExecutor<'_>, field: &str) -> Result<Option<Uuid>, DatabaseError> {
    let user_id: Option<Uuid> = sqlx::query_scalar(
        "SELECT user_id FROM field_admins WHERE field = $1 AND is_active",
    )
    .bind(field)
    .fetch_optional(db)
    .await?;
    Ok(user_id)
}

/// Whether the user holds an active assignment for any field other than `field`
pub async fn administers_other_field(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    field: &str,
) -> Result<bool, DatabaseError> {
    let found: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM field_admins WHERE user_id = $1 AND is_active AND field <> $2)",
    )
    .bind(user_id)
    .bind(field)
    .fetch_one(db)
    .await?;
    Ok(found)
}

pub async fn deactivate(db: impl PgExecutor<'_>, id: Uuid) -> Result<FieldAdmin, DatabaseError> {
    let sql = format!(
        "UPDATE field_admins AS fa SET is_active = false, deactivated_at = now() \
         WHERE fa.id = $1 RETURNING {FIELD_ADMIN_COLUMNS}"
    );
    let row = sqlx::query_as::<_, FieldAdmin>(&sql).bind(id).fetch_one(db).await?;
    Ok(row)
}

/// Deactivate every active assignment held by a user; returns the affected fields
pub async fn deactivate_for_user(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<Vec<String>, DatabaseError> {
    let fields: Vec<String> = sqlx::query_scalar(
        "UPDATE field_admins SET is_active = false, deactivated_at = now() \
         WHERE user_id = $1 AND is_active RETURNING field",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(fields)
}

/// Insert an active assignment, or re-activate the existing (field, user) row
pub async fn activate(
    db: impl PgExecutor<'_>,
    field: &str,
    user_id: Uuid,
    assigned_by: Option<Uuid>,
) -> Result<FieldAdmin, DatabaseError> {
    let sql = format!(
        "INSERT INTO field_admins AS fa (id, field, user_id, is_active, assigned_by) \
         VALUES ($1, $2, $3, true, $4) \
         ON CONFLICT (field, user_id) DO UPDATE SET \
            is_active = true, assigned_by = EXCLUDED.assigned_by, \
            assigned_at = now(), deactivated_at = NULL \
         RETURNING {FIELD_ADMIN_COLUMNS}"
    );
    let row = sqlx::query_as::<_, FieldAdmin>(&sql)
        .bind(Uuid::new_v4())
        .bind(field)
        .bind(user_id)
        .bind(assigned_by)
        .fetch_one(db)
        .await?;
    Ok(row)
}

pub async fn list(db: impl PgExecutor<'_>, include_inactive: bool) -> Result<Vec<FieldAdminView>, DatabaseError> {
    let sql = format!(
        "SELECT {FIELD_ADMIN_COLUMNS}, u.name AS user_name, u.email AS user_email \
         FROM field_admins fa JOIN users u ON u.id = fa.user_id \
         WHERE $1 OR fa.is_active \
         ORDER BY fa.field, fa.is_active DESC, fa.assigned_at DESC"
    );
    let rows = sqlx::query_as::<_, FieldAdminView>(&sql)
        .bind(include_inactive)
        .fetch_all(db)
        .await?;
    Ok(rows)
}
