// handlers/protected/notifications.rs - Own notifications
//
// GET    /api/notifications
// GET    /api/notifications/unread-count
// POST   /api/notifications/:id/read
// POST   /api/notifications/read-all
// DELETE /api/notifications/:id

use axum::extract::{Extension, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ApiQuery, Page, PageParams};
use crate::database::models::Notification;
use crate::database::repository::notifications;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Default, Deserialize)]
pub struct NotificationFilter {
    pub unread: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::not_found(format!("Notification {} not found", id))
}

/// GET /api/notifications?unread=true&page=&per_page= - Newest first
pub async fn notifications_get(
    Extension(user): Extension<CurrentUser>,
    ApiQuery(filter): ApiQuery<NotificationFilter>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Page<Notification>> {
    let pool = DatabaseManager::pool().await?;
    let page = notifications::list_for_user(&pool, user.id, filter.unread.unwrap_or(false), paging.window()).await?;
    Ok(ApiResponse::success(page))
}

pub async fn unread_count_get(Extension(user): Extension<CurrentUser>) -> ApiResult<UnreadCount> {
    let pool = DatabaseManager::pool().await?;
    let count = notifications::unread_count(&pool, user.id).await?;
    Ok(ApiResponse::success(UnreadCount { count }))
}

/// POST /api/notifications/:id/read - 404 unless the notification is the caller's
pub async fn read_post(Extension(user): Extension<CurrentUser>, Path(id): Path<Uuid>) -> ApiResult<()> {
    let pool = DatabaseManager::pool().await?;
    if !notifications::mark_read(&pool, user.id, id).await? {
        return Err(not_found(id));
    }
    Ok(ApiResponse::no_content())
}

pub async fn read_all_post(Extension(user): Extension<CurrentUser>) -> ApiResult<MarkedRead> {
    let pool = DatabaseManager::pool().await?;
    let updated = notifications::mark_all_read(&pool, user.id).await?;
    Ok(ApiResponse::success(MarkedRead { updated }))
}

pub async fn notification_delete(Extension(user): Extension<CurrentUser>, Path(id): Path<Uuid>) -> ApiResult<()> {
    let pool = DatabaseManager::pool().await?;
    if !notifications::delete(&pool, user.id, id).await? {
        return Err(not_found(id));
    }
    Ok(ApiResponse::no_content())
}
