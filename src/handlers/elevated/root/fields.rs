// handlers/elevated/root/fields.rs - Field catalogue maintenance
//
// POST   /api/root/fields
// DELETE /api/root/fields/:name

use axum::extract::{Extension, Path};
use serde::Deserialize;

use crate::api::validation::{clean_optional, FieldErrors, MAX_LONG_TEXT_LEN, MAX_NAME_LEN};
use crate::api::ApiJson;
use crate::database::models::Field;
use crate::database::repository::fields;
use crate::database::{DatabaseError, DatabaseManager};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct FieldPayload {
    pub name: String,
    pub description: Option<String>,
}

/// POST /api/root/fields - `{"name": "Physics", "description": "optional"}`; 409 if it exists
pub async fn field_post(
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<FieldPayload>,
) -> ApiResult<Field> {
    let name = payload.name.trim();
    let description = clean_optional(payload.description);

    let mut errors = FieldErrors::new();
    errors.check("name", !name.is_empty(), "Name is required");
    errors.max_len("name", Some(name), MAX_NAME_LEN);
    errors.max_len("description", description.as_deref(), MAX_LONG_TEXT_LEN);
    errors.into_result()?;

    let pool = DatabaseManager::pool().await?;
    let field = fields::insert(&pool, name, description.as_deref()).await?;

    tracing::info!("Field '{}' created by {}", field.name, user.id);
    Ok(ApiResponse::created(field))
}

/// DELETE /api/root/fields/:name - 409 while users, submissions or events reference it
pub async fn field_delete(Extension(user): Extension<CurrentUser>, Path(name): Path<String>) -> ApiResult<()> {
    let pool = DatabaseManager::pool().await?;

    match fields::delete(&pool, &name).await {
        Ok(true) => {
            tracing::info!("Field '{}' deleted by {}", name, user.id);
            Ok(ApiResponse::no_content())
        }
        Ok(false) => Err(ApiError::not_found(format!("Field '{}' not found", name))),
        Err(DatabaseError::ForeignKeyViolation(constraint)) => {
            tracing::debug!("Field '{}' still referenced via {}", name, constraint);
            Err(ApiError::conflict(format!("Field '{}' is still in use", name)))
        }
        Err(e) => Err(e.into()),
    }
}
