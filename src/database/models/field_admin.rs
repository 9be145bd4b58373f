use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FieldAdmin {
    pub id: Uuid,
    pub field: String,
    pub user_id: Uuid,
    pub is_active: bool,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FieldAdminView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub assignment: FieldAdmin,
    pub user_name: String,
    pub user_email: String,
}
