use sqlx::PgPool;
use uuid::Uuid;

use super::notification_service::notify_user;
use crate::database::models::Submission;
use crate::database::repository::notifications::NewNotification;
use crate::database::repository::submissions::{self, NewSubmission};
use crate::database::repository::{field_admins, fields, users};
use crate::database::{DatabaseError, DatabaseManager};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::types::{NotificationKind, Role, SubmissionStatus};

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Only unverified accounts can request verification")]
    AlreadyVerified,
    #[error("Unknown field '{0}'")]
    UnknownField(String),
    #[error("Submission {0} not found")]
    NotFound(Uuid),
    #[error("Submission is already {0}")]
    NotPending(SubmissionStatus),
    #[error("You do not manage the field '{0}'")]
    NotManaged(String),
}

impl From<VerificationError> for ApiError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Database(e) => e.into(),
            VerificationError::AlreadyVerified => ApiError::forbidden(err.to_string()),
            VerificationError::UnknownField(_) => ApiError::invalid_field("field", err.to_string()),
            VerificationError::NotFound(_) => ApiError::not_found(err.to_string()),
            VerificationError::NotPending(_) => ApiError::conflict(err.to_string()),
            VerificationError::NotManaged(_) => ApiError::forbidden(err.to_string()),
        }
    }
}

/// Validated verification request
#[derive(Debug)]
pub struct SubmissionRequest {
    pub field: String,
    pub batch_year: i32,
    pub roll_number: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn status(self) -> SubmissionStatus {
        match self {
            Decision::Approve => SubmissionStatus::Approved,
            Decision::Reject => SubmissionStatus::Rejected,
        }
    }
}

pub struct VerificationService {
    pool: PgPool,
}

impl VerificationService {
    pub async fn new() -> Result<Self, VerificationError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// File a verification request. A second pending request hits the
    /// one-pending-per-user index and surfaces as a conflict.
    pub async fn submit(&self, user: &CurrentUser, request: SubmissionRequest) -> Result<Submission, VerificationError> {
        if user.role != Role::Unverified {
            return Err(VerificationError::AlreadyVerified);
        }
        if !fields::exists(&self.pool, &request.field).await? {
            return Err(VerificationError::UnknownField(request.field));
        }

        let submission = submissions::insert(
            &self.pool,
            NewSubmission {
                user_id: user.id,
                field: &request.field,
                batch_year: request.batch_year,
                roll_number: &request.roll_number,
                note: request.note.as_deref(),
            },
        )
        .await?;

        tracing::info!("User {} submitted verification {} for {}", user.id, submission.id, submission.field);

        if let Some(admin_id) = field_admins::active_admin_of(&self.pool, &submission.field).await? {
            let notification = NewNotification::new(
                NotificationKind::SubmissionReceived,
                format!("New verification request from {}", user.name),
            )
            .body(format!("{} batch {}", submission.field, submission.batch_year))
            .link(format!("/api/admin/submissions?status=pending#{}", submission.id));
            notify_user(&self.pool, admin_id, notification).await;
        }

        Ok(submission)
    }

    /// Approve or reject a pending submission in one transaction.
    /// Approval promotes an unverified user to alumni and records field and batch.
    pub async fn review(
        &self,
        reviewer: &CurrentUser,
        submission_id: Uuid,
        decision: Decision,
        note: Option<&str>,
    ) -> Result<Submission, VerificationError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let submission = submissions::find_for_update(&mut *tx, submission_id)
            .await?
            .ok_or(VerificationError::NotFound(submission_id))?;

        if !reviewer.manages_field(&submission.field) {
            tracing::warn!(
                "User {} tried to review submission {} outside their field",
                reviewer.id, submission.id
            );
            return Err(VerificationError::NotManaged(submission.field));
        }
        if submission.status != SubmissionStatus::Pending {
            return Err(VerificationError::NotPending(submission.status));
        }

        let reviewed = submissions::record_review(&mut *tx, submission.id, decision.status(), reviewer.id, note).await?;
        if decision == Decision::Approve {
            users::mark_verified(&mut *tx, submission.user_id, &submission.field, submission.batch_year).await?;
        }

        tx.commit().await.map_err(DatabaseError::from)?;

        tracing::info!(
            "Submission {} {} by {} (user {})",
            reviewed.id, reviewed.status, reviewer.id, reviewed.user_id
        );

        let notification = match decision {
            Decision::Approve => NewNotification::new(
                NotificationKind::SubmissionApproved,
                "Your alumni verification was approved",
            ),
            Decision::Reject => NewNotification::new(
                NotificationKind::SubmissionRejected,
                "Your alumni verification was rejected",
            ),
        };
        let notification = match note {
            Some(note) => notification.body(note),
            None => notification,
        };
        notify_user(&self.pool, reviewed.user_id, notification.link("/api/submissions")).await;

        Ok(reviewed)
    }
}
