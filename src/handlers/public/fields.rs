// handlers/public/fields.rs - GET /api/fields

use crate::database::models::Field;
use crate::database::repository::fields;
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/fields - The field catalogue, ordered by name. Public so that
/// registration forms can offer it.
pub async fn list_get() -> ApiResult<Vec<Field>> {
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(fields::list(&pool).await?))
}
