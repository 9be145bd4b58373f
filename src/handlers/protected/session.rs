// handlers/protected/session.rs - Session management for authenticated users
//
// GET  /api/auth/whoami
// POST /api/auth/refresh
// PUT  /api/auth/password

use axum::extract::Extension;
use serde::{Deserialize, Serialize};

use super::profile::ProfileView;
use crate::api::validation::FieldErrors;
use crate::api::ApiJson;
use crate::auth::{hash_password_blocking, verify_password_blocking};
use crate::database::models::User;
use crate::database::repository::{profiles, users};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::handlers::public::auth::{check_password, SessionResponse};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user: User,
    pub profile: ProfileView,
    pub administered_field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

async fn load_user(current: &CurrentUser) -> Result<User, ApiError> {
    let pool = DatabaseManager::pool().await?;
    users::find_by_id(&pool, current.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))
}

/// GET /api/auth/whoami - Current account, profile and administered field
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "user": { "id": "…", "email": "ada@example.org", "role": "alumni", … },
///     "profile": { "headline": "…", "photo_url": "…", … },
///     "administered_field": null
///   }
/// }
/// ```
pub async fn whoami_get(Extension(current): Extension<CurrentUser>) -> ApiResult<WhoamiResponse> {
    let user = load_user(&current).await?;
    let pool = DatabaseManager::pool().await?;
    let profile = profiles::find(&pool, user.id).await?;

    Ok(ApiResponse::success(WhoamiResponse {
        user,
        profile: ProfileView::new(profile)?,
        administered_field: current.administered_field,
    }))
}

/// POST /api/auth/refresh - New token carrying the role currently stored for the user
pub async fn refresh_post(Extension(current): Extension<CurrentUser>) -> ApiResult<SessionResponse> {
    let user = load_user(&current).await?;
    Ok(ApiResponse::success(SessionResponse::issue(user)?))
}

/// PUT /api/auth/password - Change password; the current password must match
pub async fn password_put(
    Extension(current): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<PasswordChange>,
) -> ApiResult<()> {
    let mut errors = FieldErrors::new();
    check_password(&mut errors, "new_password", &payload.new_password);
    errors.into_result()?;

    let user = load_user(&current).await?;
    if !verify_password_blocking(payload.current_password, Some(user.password_hash.clone())).await? {
        tracing::warn!("Password change rejected for {}: wrong current password", user.id);
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let password_hash = hash_password_blocking(payload.new_password).await?;
    let pool = DatabaseManager::pool().await?;
    users::update_password(&pool, user.id, &password_hash).await?;

    tracing::info!("Password changed for {}", user.id);
    Ok(ApiResponse::no_content())
}
