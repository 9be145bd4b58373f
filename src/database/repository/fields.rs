use sqlx::PgExecutor;

use crate::database::manager::DatabaseError;
use crate::database::models::Field;

pub async fn list(db: impl PgExecutor<'_>) -> Result<Vec<Field>, DatabaseError> {
    let fields = sqlx::query_as::<_, Field>("SELECT name, description, created_at FROM fields ORDER BY name")
        .fetch_all(db)
        .await?;
    Ok(fields)
}

pub async fn exists(db: impl PgExecutor<'_>, name: &str) -> Result<bool, DatabaseError> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM fields WHERE name = $1)")
        .bind(name)
        .fetch_one(db)
        .await?;
    Ok(found)
}

pub async fn insert(db: impl PgExecutor<'_>, name: &str, description: Option<&str>) -> Result<Field, DatabaseError> {
    let field = sqlx::query_as::<_, Field>(
        "INSERT INTO fields (name, description) VALUES ($1, $2) RETURNING name, description, created_at",
    )
    .bind(name)
    .bind(description)
    .fetch_one(db)
    .await?;
    Ok(field)
}

/// Fails with a foreign-key violation while users, submissions or events still reference it
pub async fn delete(db: impl PgExecutor<'_>, name: &str) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM fields WHERE name = $1")
        .bind(name)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
