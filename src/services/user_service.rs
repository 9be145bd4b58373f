use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::User;
use crate::database::repository::{field_admins, users};
use crate::database::{DatabaseError, DatabaseManager};
use crate::error::ApiError;
use crate::types::Role;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("User {0} not found")]
    NotFound(Uuid),
    #[error("You cannot deactivate your own account")]
    SelfDeactivation,
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Database(e) => e.into(),
            UserError::NotFound(_) => ApiError::not_found(err.to_string()),
            UserError::SelfDeactivation => ApiError::bad_request(err.to_string()),
        }
    }
}

/// Account activation managed by the super admin
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, UserError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Deactivate an account. An active field admin also loses their
    /// assignments and returns to alumni in the same transaction.
    pub async fn deactivate(&self, actor: Uuid, user_id: Uuid) -> Result<User, UserError> {
        if actor == user_id {
            return Err(UserError::SelfDeactivation);
        }

        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        // Same lock order as field admin reassignment: assignments, then the user
        field_admins::lock_active_for_user(&mut *tx, user_id).await?;
        let user = users::find_by_id_for_update(&mut *tx, user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        users::set_active(&mut *tx, user.id, false).await?;
        let released = field_admins::deactivate_for_user(&mut *tx, user.id).await?;
        if user.role == Role::FieldAdmin {
            users::update_role(&mut *tx, user.id, Role::Alumni).await?;
        }

        let updated = users::find_by_id(&mut *tx, user.id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;
        tx.commit().await.map_err(DatabaseError::from)?;

        tracing::info!(
            "User {} deactivated by {} (released fields: {:?})",
            user_id, actor, released
        );
        Ok(updated)
    }

    pub async fn activate(&self, actor: Uuid, user_id: Uuid) -> Result<User, UserError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        if users::find_by_id_for_update(&mut *tx, user_id).await?.is_none() {
            return Err(UserError::NotFound(user_id));
        }
        users::set_active(&mut *tx, user_id, true).await?;
        let updated = users::find_by_id(&mut *tx, user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;
        tx.commit().await.map_err(DatabaseError::from)?;

        tracing::info!("User {} activated by {}", user_id, actor);
        Ok(updated)
    }
}
