use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::notification_service::notify_user;
use crate::database::models::FieldAdmin;
use crate::database::repository::notifications::NewNotification;
use crate::database::repository::{field_admins, fields, users};
use crate::database::{DatabaseError, DatabaseManager};
use crate::error::ApiError;
use crate::types::{NotificationKind, Role};

#[derive(Debug, thiserror::Error)]
pub enum FieldAdminError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Field '{0}' not found")]
    FieldNotFound(String),
    #[error("User {0} not found")]
    UserNotFound(Uuid),
    #[error("User is deactivated")]
    UserInactive,
    #[error("User must be a verified alumnus")]
    UserUnverified,
    #[error("A super admin cannot be assigned as field admin")]
    SuperAdminTarget,
    #[error("User belongs to {found}, not '{field}'")]
    FieldMismatch { field: String, found: String },
    #[error("User already administers '{0}'")]
    AdminOfOtherField(String),
    #[error("Field '{0}' has no active admin")]
    NoActiveAdmin(String),
}

impl From<FieldAdminError> for ApiError {
    fn from(err: FieldAdminError) -> Self {
        match err {
            FieldAdminError::Database(e) => e.into(),
            FieldAdminError::FieldNotFound(_)
            | FieldAdminError::UserNotFound(_)
            | FieldAdminError::NoActiveAdmin(_) => ApiError::not_found(err.to_string()),
            FieldAdminError::UserInactive | FieldAdminError::UserUnverified | FieldAdminError::SuperAdminTarget => {
                ApiError::bad_request(err.to_string())
            }
            FieldAdminError::FieldMismatch { .. } => ApiError::invalid_field("user_id", err.to_string()),
            FieldAdminError::AdminOfOtherField(_) => ApiError::conflict(err.to_string()),
        }
    }
}

/// Result of an assignment: the active row plus whoever lost the field
#[derive(Debug, Serialize)]
pub struct Assignment {
    pub assignment: FieldAdmin,
    pub previous_admin: Option<Uuid>,
    pub changed: bool,
}

pub struct FieldAdminService {
    pool: PgPool,
}

impl FieldAdminService {
    pub async fn new() -> Result<Self, FieldAdminError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Make `user_id` the active admin of `field`, replacing the current one.
    /// `assigned_by` is `None` for operator tooling.
    ///
    /// Runs in one transaction holding a lock on the field's active row;
    /// any failure rolls the whole reassignment back. Locks are taken
    /// field_admins rows first, then users rows.
    pub async fn assign(
        &self,
        field: &str,
        user_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<Assignment, FieldAdminError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        if !fields::exists(&mut *tx, field).await? {
            return Err(FieldAdminError::FieldNotFound(field.to_string()));
        }

        let current = field_admins::find_active_for_update(&mut *tx, field).await?;
        if let Some(current) = current.as_ref().filter(|row| row.user_id == user_id) {
            tx.commit().await.map_err(DatabaseError::from)?;
            tracing::debug!("User {} already administers {}", user_id, field);
            return Ok(Assignment {
                assignment: current.clone(),
                previous_admin: None,
                changed: false,
            });
        }

        let previous_admin = match current {
            Some(row) => {
                field_admins::deactivate(&mut *tx, row.id).await?;
                demote_if_unassigned(&mut tx, row.user_id, field).await?;
                Some(row.user_id)
            }
            None => None,
        };

        let target = users::find_by_id_for_update(&mut *tx, user_id)
            .await?
            .ok_or(FieldAdminError::UserNotFound(user_id))?;
        if !target.is_active {
            return Err(FieldAdminError::UserInactive);
        }
        if target.role == Role::SuperAdmin {
            return Err(FieldAdminError::SuperAdminTarget);
        }
        if !target.role.is_verified() {
            return Err(FieldAdminError::UserUnverified);
        }
        if target.field.as_deref() != Some(field) {
            return Err(FieldAdminError::FieldMismatch {
                field: field.to_string(),
                found: target
                    .field
                    .as_deref()
                    .map_or_else(|| "no field".to_string(), |f| format!("'{}'", f)),
            });
        }
        if field_admins::administers_other_field(&mut *tx, target.id, field).await? {
            let other = field_admins::active_field_for_user(&mut *tx, target.id)
                .await?
                .unwrap_or_default();
            return Err(FieldAdminError::AdminOfOtherField(other));
        }

        if target.role != Role::FieldAdmin {
            users::update_role(&mut *tx, target.id, Role::FieldAdmin).await?;
        }
        let assignment = field_admins::activate(&mut *tx, field, target.id, assigned_by).await?;

        tx.commit().await.map_err(DatabaseError::from)?;

        tracing::info!(
            "Field {} reassigned to {} by {:?} (previous: {:?})",
            field, target.id, assigned_by, previous_admin
        );

        notify_user(
            &self.pool,
            target.id,
            NewNotification::new(
                NotificationKind::FieldAdminAssigned,
                format!("You are now the admin of {}", field),
            ),
        )
        .await;
        if let Some(previous) = previous_admin {
            notify_removed(&self.pool, previous, field).await;
        }

        Ok(Assignment {
            assignment,
            previous_admin,
            changed: true,
        })
    }

    /// Deactivate the field's active admin and demote them where nothing else keeps the role
    pub async fn remove(&self, field: &str) -> Result<FieldAdmin, FieldAdminError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let current = field_admins::find_active_for_update(&mut *tx, field)
            .await?
            .ok_or_else(|| FieldAdminError::NoActiveAdmin(field.to_string()))?;
        let removed = field_admins::deactivate(&mut *tx, current.id).await?;
        demote_if_unassigned(&mut tx, current.user_id, field).await?;

        tx.commit().await.map_err(DatabaseError::from)?;

        tracing::info!("Removed {} as admin of {}", removed.user_id, field);
        notify_removed(&self.pool, removed.user_id, field).await;

        Ok(removed)
    }
}

/// Return a former field admin to alumni unless they still hold another
/// active assignment or are a super admin
async fn demote_if_unassigned(conn: &mut PgConnection, user_id: Uuid, field: &str) -> Result<(), DatabaseError> {
    let Some(user) = users::find_by_id_for_update(&mut *conn, user_id).await? else {
        return Ok(());
    };
    if user.role != Role::FieldAdmin {
        return Ok(());
    }
    if field_admins::administers_other_field(&mut *conn, user_id, field).await? {
        return Ok(());
    }
    users::update_role(&mut *conn, user_id, Role::Alumni).await?;
    tracing::info!("Demoted former admin {} of {} to alumni", user_id, field);
    Ok(())
}

async fn notify_removed(pool: &PgPool, user_id: Uuid, field: &str) {
    notify_user(
        pool,
        user_id,
        NewNotification::new(
            NotificationKind::FieldAdminRemoved,
            format!("You are no longer the admin of {}", field),
        ),
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn assignment_errors_map_to_http() {
        let cases = [
            (FieldAdminError::FieldNotFound("Physics".into()), StatusCode::NOT_FOUND),
            (FieldAdminError::UserNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (FieldAdminError::UserUnverified, StatusCode::BAD_REQUEST),
            (FieldAdminError::UserInactive, StatusCode::BAD_REQUEST),
            (FieldAdminError::SuperAdminTarget, StatusCode::BAD_REQUEST),
            (FieldAdminError::AdminOfOtherField("Chemistry".into()), StatusCode::CONFLICT),
            (
                FieldAdminError::FieldMismatch { field: "Engineering".into(), found: "'Medicine'".into() },
                StatusCode::BAD_REQUEST,
            ),
            (FieldAdminError::NoActiveAdmin("Physics".into()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), status, "{}", api.message());
        }
    }

    #[test]
    fn conflicting_field_is_named() {
        let err = FieldAdminError::AdminOfOtherField("Chemistry".into());
        assert_eq!(err.to_string(), "User already administers 'Chemistry'");
    }

    #[test]
    fn field_mismatch_is_reported_against_user_id() {
        let err = FieldAdminError::FieldMismatch { field: "Engineering".into(), found: "'Medicine'".into() };
        assert_eq!(err.to_string(), "User belongs to 'Medicine', not 'Engineering'");
        let api: ApiError = err.into();
        assert_eq!(api.to_json()["field_errors"]["user_id"], "User belongs to 'Medicine', not 'Engineering'");
    }
}
