use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
