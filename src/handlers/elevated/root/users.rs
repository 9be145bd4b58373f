// handlers/elevated/root/users.rs - Account activation
//
// POST /api/root/users/:id/deactivate
// POST /api/root/users/:id/activate

use axum::extract::{Extension, Path};
use uuid::Uuid;

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::UserService;

/// Deactivating a field admin also releases their field and demotes them to alumni
pub async fn deactivate_post(Extension(user): Extension<CurrentUser>, Path(id): Path<Uuid>) -> ApiResult<User> {
    let service = UserService::new().await?;
    Ok(ApiResponse::success(service.deactivate(user.id, id).await?))
}

pub async fn activate_post(Extension(user): Extension<CurrentUser>, Path(id): Path<Uuid>) -> ApiResult<User> {
    let service = UserService::new().await?;
    Ok(ApiResponse::success(service.activate(user.id, id).await?))
}
