// handlers/elevated/root/field_admins.rs - Field admin assignment
//
// GET    /api/root/field-admins
// PUT    /api/root/field-admins/:field
// DELETE /api/root/field-admins/:field

use axum::extract::{Extension, Path};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{ApiJson, ApiQuery};
use crate::database::models::{FieldAdmin, FieldAdminView};
use crate::database::repository::field_admins;
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::field_admin_service::Assignment;
use crate::services::FieldAdminService;

#[derive(Debug, Default, Deserialize)]
pub struct AdminFilter {
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AssignPayload {
    pub user_id: Uuid,
}

/// GET /api/root/field-admins?include_inactive=true
pub async fn field_admins_get(ApiQuery(filter): ApiQuery<AdminFilter>) -> ApiResult<Vec<FieldAdminView>> {
    let pool = DatabaseManager::pool().await?;
    let rows = field_admins::list(&pool, filter.include_inactive.unwrap_or(false)).await?;
    Ok(ApiResponse::success(rows))
}

/// PUT /api/root/field-admins/:field - `{"user_id": "…"}`
///
/// Replaces the field's admin in a single transaction. Assigning the
/// current admin again returns the existing row with `changed: false`.
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "assignment": { "field": "Physics", "user_id": "…", "is_active": true, … },
///     "previous_admin": "…",
///     "changed": true
///   }
/// }
/// ```
pub async fn field_admin_put(
    Extension(user): Extension<CurrentUser>,
    Path(field): Path<String>,
    ApiJson(payload): ApiJson<AssignPayload>,
) -> ApiResult<Assignment> {
    let service = FieldAdminService::new().await?;
    let assignment = service.assign(&field, payload.user_id, Some(user.id)).await?;
    Ok(ApiResponse::success(assignment))
}

/// DELETE /api/root/field-admins/:field - Remove the active admin; 404 if there is none
pub async fn field_admin_delete(
    Extension(user): Extension<CurrentUser>,
    Path(field): Path<String>,
) -> ApiResult<FieldAdmin> {
    let service = FieldAdminService::new().await?;
    let removed = service.remove(&field).await?;
    tracing::info!("Field admin of {} removed by {}", field, user.id);
    Ok(ApiResponse::success(removed))
}
