use axum::{extract::Request, middleware::Next, response::Response};
use serde::Serialize;
use uuid::Uuid;

use super::auth::AuthUser;
use crate::database::repository::{field_admins, users};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::types::Role;

/// The authenticated, active user as currently stored in the database
#[derive(Clone, Debug, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub field: Option<String>,
    pub batch_year: Option<i32>,
    /// Field held through an active field_admins row
    pub administered_field: Option<String>,
}

impl CurrentUser {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn require(&self, required: Role) -> Result<(), ApiError> {
        if self.role.at_least(required) {
            Ok(())
        } else {
            tracing::warn!(
                "Access denied: user {} has role {} but {} is required",
                self.id, self.role, required
            );
            Err(ApiError::forbidden(match required {
                Role::Alumni => "Account verification is required",
                Role::FieldAdmin => "Field admin access is required",
                Role::SuperAdmin => "Super admin access is required",
                Role::Unverified => "Access denied",
            }))
        }
    }

    /// Field a field admin has authority over: their active assignment,
    /// provided it is also the field they belong to
    pub fn managed_field(&self) -> Option<&str> {
        if self.role != Role::FieldAdmin {
            return None;
        }
        self.administered_field
            .as_deref()
            .filter(|administered| self.field.as_deref() == Some(*administered))
    }

    /// Super admins manage every field; field admins only their active assignment
    pub fn manages_field(&self, field: &str) -> bool {
        match self.role {
            Role::SuperAdmin => true,
            Role::FieldAdmin => self.managed_field() == Some(field),
            _ => false,
        }
    }

    pub fn require_manages_field(&self, field: &str) -> Result<(), ApiError> {
        if self.manages_field(field) {
            Ok(())
        } else {
            tracing::warn!("Access denied: user {} does not manage field '{}'", self.id, field);
            Err(ApiError::forbidden(format!("You do not manage the field '{}'", field)))
        }
    }

    /// Field-scoped content is visible to members of the field and its managers
    pub fn can_see_field(&self, field: Option<&str>) -> bool {
        match field {
            None => true,
            Some(f) => self.is_super_admin() || self.field.as_deref() == Some(f) || self.manages_field(f),
        }
    }

    /// Field a listing should be restricted to; `None` = all fields (super admin)
    pub fn review_scope(&self) -> Result<Option<String>, ApiError> {
        if self.is_super_admin() {
            return Ok(None);
        }
        self.require(Role::FieldAdmin)?;
        self.managed_field()
            .map(|field| Some(field.to_string()))
            .ok_or_else(|| ApiError::forbidden("No active field assignment"))
    }
}

/// Middleware that loads the user named by the JWT and rejects missing or deactivated accounts.
/// The stored role wins over the role in the token, so promotions apply without re-login.
pub async fn validate_user_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let pool = DatabaseManager::pool().await?;

    let user = users::find_by_id(&pool, auth_user.user_id).await?.ok_or_else(|| {
        tracing::warn!("User validation failed: user {} not found", auth_user.user_id);
        ApiError::unauthorized("User no longer exists")
    })?;

    if !user.is_active {
        tracing::warn!("User validation failed: user {} is deactivated", user.id);
        return Err(ApiError::forbidden("Account is deactivated"));
    }

    if user.role != auth_user.token_role {
        tracing::debug!(
            "Role changed since token issue for {}: token {} / stored {}",
            user.id, auth_user.token_role, user.role
        );
    }

    let administered_field = if user.role == Role::FieldAdmin {
        field_admins::active_field_for_user(&pool, user.id).await?
    } else {
        None
    };

    let current = CurrentUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        field: user.field,
        batch_year: user.batch_year,
        administered_field,
    };

    tracing::debug!("User validation successful: {} ({})", current.email, current.role);
    request.extensions_mut().insert(current);

    Ok(next.run(request).await)
}

#[cfg(test)]
pub(crate) fn test_user(role: Role, field: Option<&str>, administered: Option<&str>) -> CurrentUser {
    CurrentUser {
        id: Uuid::new_v4(),
        name: "Test User".into(),
        email: "test@example.org".into(),
        role,
        field: field.map(str::to_string),
        batch_year: Some(2015),
        administered_field: administered.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_admin_manages_only_assigned_field() {
        let admin = test_user(Role::FieldAdmin, Some("Physics"), Some("Physics"));
        assert!(admin.manages_field("Physics"));
        assert!(!admin.manages_field("Chemistry"));
        assert!(admin.require_manages_field("Chemistry").is_err());
    }

    #[test]
    fn field_admin_without_assignment_manages_nothing() {
        let admin = test_user(Role::FieldAdmin, Some("Physics"), None);
        assert!(!admin.manages_field("Physics"));
        assert!(admin.review_scope().is_err());
    }

    #[test]
    fn assignment_outside_own_field_grants_nothing() {
        let admin = test_user(Role::FieldAdmin, Some("Medicine"), Some("Engineering"));
        assert_eq!(admin.managed_field(), None);
        assert!(!admin.manages_field("Engineering"));
        assert!(!admin.manages_field("Medicine"));
        assert!(admin.review_scope().is_err());
        assert!(!admin.can_see_field(Some("Engineering")));
    }

    #[test]
    fn demoted_user_keeps_no_authority() {
        let alum = test_user(Role::Alumni, Some("Physics"), Some("Physics"));
        assert_eq!(alum.managed_field(), None);
        assert!(!alum.manages_field("Physics"));
    }

    #[test]
    fn super_admin_sees_everything() {
        let root = test_user(Role::SuperAdmin, None, None);
        assert!(root.manages_field("Anything"));
        assert!(root.can_see_field(Some("Physics")));
        assert_eq!(root.review_scope().unwrap(), None);
    }

    #[test]
    fn alumni_see_own_field_and_global_content() {
        let alum = test_user(Role::Alumni, Some("Physics"), None);
        assert!(alum.can_see_field(None));
        assert!(alum.can_see_field(Some("Physics")));
        assert!(!alum.can_see_field(Some("Chemistry")));
        assert!(alum.review_scope().is_err());
    }

    #[test]
    fn require_checks_role_order() {
        let unverified = test_user(Role::Unverified, None, None);
        let err = unverified.require(Role::Alumni).unwrap_err();
        assert_eq!(err.message(), "Account verification is required");
        assert!(test_user(Role::FieldAdmin, None, None).require(Role::Alumni).is_ok());
    }
}
