use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Profile;

const PROFILE_COLUMNS: &str =
    "user_id, headline, bio, company, job_title, location, linkedin_url, phone, photo_key, updated_at";

/// Profile columns a user may edit
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub phone: Option<String>,
}

pub async fn create_empty(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<(), DatabaseError> {
    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Missing rows read as an empty profile
pub async fn find(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<Profile, DatabaseError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1");
    let profile = sqlx::query_as::<_, Profile>(&sql)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(profile.unwrap_or(Profile { user_id, ..Default::default() }))
}

/// Apply changes: `None` keeps a column, an empty string clears it
pub async fn update(
    pool: &PgPool,
    user_id: Uuid,
    changes: ProfileChanges,
) -> Result<Profile, DatabaseError> {
    create_empty(pool, user_id).await?;

    let sql = format!(
        "UPDATE profiles SET \
            headline = NULLIF(COALESCE($2, headline), ''), \
            bio = NULLIF(COALESCE($3, bio), ''), \
            company = NULLIF(COALESCE($4, company), ''), \
            job_title = NULLIF(COALESCE($5, job_title), ''), \
            location = NULLIF(COALESCE($6, location), ''), \
            linkedin_url = NULLIF(COALESCE($7, linkedin_url), ''), \
            phone = NULLIF(COALESCE($8, phone), ''), \
            updated_at = now() \
         WHERE user_id = $1 RETURNING {PROFILE_COLUMNS}"
    );
    let profile = sqlx::query_as::<_, Profile>(&sql)
        .bind(user_id)
        .bind(changes.headline)
        .bind(changes.bio)
        .bind(changes.company)
        .bind(changes.job_title)
        .bind(changes.location)
        .bind(changes.linkedin_url)
        .bind(changes.phone)
        .fetch_one(pool)
        .await?;
    Ok(profile)
}

/// Set (or clear) the photo key, returning the previous key
pub async fn replace_photo_key(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    photo_key: Option<&str>,
) -> Result<Option<String>, DatabaseError> {
    let previous: Option<Option<String>> = sqlx::query_scalar(
        "WITH old AS (SELECT photo_key FROM profiles WHERE user_id = $1 FOR UPDATE) \
         INSERT INTO profiles (user_id, photo_key) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE SET photo_key = EXCLUDED.photo_key, updated_at = now() \
         RETURNING (SELECT photo_key FROM old)",
    )
    .bind(user_id)
    .bind(photo_key)
    .fetch_optional(db)
    .await?;
    Ok(previous.flatten())
}
