//! Route-level role guards. Layered after `validate_user_middleware`.

use axum::{extract::Request, middleware::Next, response::Response};

use super::validate_user::CurrentUser;
use crate::error::ApiError;
use crate::types::Role;

async fn require(role: Role, request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::unauthorized("User validation required before role check"))?;
    user.require(role)?;
    Ok(next.run(request).await)
}

pub async fn require_verified(request: Request, next: Next) -> Result<Response, ApiError> {
    require(Role::Alumni, request, next).await
}

pub async fn require_field_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    require(Role::FieldAdmin, request, next).await
}

pub async fn require_super_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    require(Role::SuperAdmin, request, next).await
}
