// handlers/elevated/admin/users.rs - GET /api/admin/users

use axum::extract::Extension;
use serde::Deserialize;

use crate::api::{ApiQuery, Page, PageParams};
use crate::database::query_builder::{DirectoryQuery, DirectorySort};
use crate::database::repository::users;
use crate::database::DatabaseManager;
use crate::handlers::protected::profile::DirectoryCard;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::types::Role;

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub field: Option<String>,
    pub role: Option<Role>,
    pub q: Option<String>,
}

/// GET /api/admin/users?field=&role=&q=&page=&per_page=
///
/// Every account of the managed field, including unverified and deactivated
/// ones, newest first. Super admins may list any field or all of them.
pub async fn users_get(
    Extension(user): Extension<CurrentUser>,
    ApiQuery(filter): ApiQuery<UserFilter>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Page<DirectoryCard>> {
    let requested = filter.field.filter(|f| !f.trim().is_empty());
    let field = match user.review_scope()? {
        None => requested,
        Some(managed) => {
            if let Some(other) = requested.as_deref().filter(|f| *f != managed) {
                user.require_manages_field(other)?;
            }
            Some(managed)
        }
    };

    let query = DirectoryQuery {
        search: filter.q,
        field,
        role: filter.role,
        include_inactive: true,
        sort: DirectorySort::Recent,
        ..Default::default()
    };

    let pool = DatabaseManager::pool().await?;
    let page = users::search(&pool, &query, paging.window()).await?;
    Ok(ApiResponse::success(page.try_map(DirectoryCard::new)?))
}
