// handlers/protected/directory.rs - Alumni directory (verified users only)
//
// GET /api/directory
// GET /api/users/:id
// GET /api/batchmates

use axum::extract::{Extension, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::{DirectoryCard, ProfileView};
use crate::api::{ApiQuery, Page, PageParams};
use crate::database::models::User;
use crate::database::query_builder::{DirectoryQuery, DirectorySort};
use crate::database::repository::{profiles, users};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Default, Deserialize)]
pub struct DirectoryFilter {
    pub q: Option<String>,
    pub field: Option<String>,
    pub batch_year: Option<i32>,
    pub sort: Option<DirectorySort>,
}

#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub user: User,
    pub profile: ProfileView,
}

/// Unverified or deactivated accounts are only visible to whoever can act on them
fn can_view(viewer: &CurrentUser, user: &User) -> bool {
    if user.is_active && user.role.is_verified() {
        return true;
    }
    viewer.is_super_admin() || user.field.as_deref().map_or(false, |f| viewer.manages_field(f))
}

/// GET /api/directory?q=&field=&batch_year=&sort=name|batch_year|recent&page=&per_page=
///
/// `q` matches name, company, job title and location.
pub async fn directory_get(
    ApiQuery(filter): ApiQuery<DirectoryFilter>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Page<DirectoryCard>> {
    let query = DirectoryQuery {
        search: filter.q,
        field: filter.field.filter(|f| !f.trim().is_empty()),
        batch_year: filter.batch_year,
        verified_only: true,
        sort: filter.sort.unwrap_or_default(),
        ..Default::default()
    };

    let pool = DatabaseManager::pool().await?;
    let page = users::search(&pool, &query, paging.window()).await?;
    Ok(ApiResponse::success(page.try_map(DirectoryCard::new)?))
}

/// GET /api/users/:id - Public profile of another user
pub async fn user_get(Extension(viewer): Extension<CurrentUser>, Path(id): Path<Uuid>) -> ApiResult<PublicProfile> {
    let pool = DatabaseManager::pool().await?;

    let user = users::find_by_id(&pool, id)
        .await?
        .filter(|user| can_view(&viewer, user))
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))?;
    let profile = profiles::find(&pool, user.id).await?;

    Ok(ApiResponse::success(PublicProfile {
        user,
        profile: ProfileView::new(profile)?,
    }))
}

/// GET /api/batchmates - Verified users sharing the caller's field and batch year
pub async fn batchmates_get(
    Extension(user): Extension<CurrentUser>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Page<DirectoryCard>> {
    let (Some(field), Some(batch_year)) = (user.field.clone(), user.batch_year) else {
        return Err(ApiError::bad_request("Your account has no field and batch year yet"));
    };

    let query = DirectoryQuery {
        field: Some(field),
        batch_year: Some(batch_year),
        exclude_user: Some(user.id),
        verified_only: true,
        ..Default::default()
    };

    let pool = DatabaseManager::pool().await?;
    let page = users::search(&pool, &query, paging.window()).await?;
    Ok(ApiResponse::success(page.try_map(DirectoryCard::new)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::validate_user::test_user;
    use crate::types::Role;
    use chrono::Utc;

    fn user(role: Role, active: bool, field: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Grace".into(),
            email: "grace@example.org".into(),
            password_hash: String::new(),
            role,
            field: field.map(str::to_string),
            batch_year: Some(2010),
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn verified_active_users_are_public() {
        let viewer = test_user(Role::Alumni, Some("Physics"), None);
        assert!(can_view(&viewer, &user(Role::Alumni, true, Some("Chemistry"))));
    }

    #[test]
    fn hidden_users_need_a_manager() {
        let alum = test_user(Role::Alumni, Some("Physics"), None);
        let admin = test_user(Role::FieldAdmin, Some("Physics"), Some("Physics"));
        let root = test_user(Role::SuperAdmin, None, None);

        let pending = user(Role::Unverified, true, Some("Physics"));
        assert!(!can_view(&alum, &pending));
        assert!(can_view(&admin, &pending));
        assert!(can_view(&root, &pending));

        let deactivated = user(Role::Alumni, false, Some("Chemistry"));
        assert!(!can_view(&admin, &deactivated));
        assert!(can_view(&root, &deactivated));
    }
}
