use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Role;

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub phone: Option<String>,
    pub photo_key: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One row of the alumni directory: user identity plus profile summary
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DirectoryEntry {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub field: Option<String>,
    pub batch_year: Option<i32>,
    pub headline: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub photo_key: Option<String>,
}
