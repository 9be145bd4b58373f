// handlers/elevated/admin/submissions.rs - Verification review queue
//
// GET  /api/admin/submissions
// POST /api/admin/submissions/:id/approve
// POST /api/admin/submissions/:id/reject

use axum::extract::{Extension, Path};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::validation::{clean_optional, FieldErrors, MAX_LONG_TEXT_LEN};
use crate::api::{ApiJson, ApiQuery, OptionalApiJson, Page, PageParams};
use crate::database::models::{Submission, SubmissionWithUser};
use crate::database::repository::submissions;
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::verification_service::Decision;
use crate::services::VerificationService;
use crate::types::SubmissionStatus;

#[derive(Debug, Default, Deserialize)]
pub struct ReviewFilter {
    pub status: Option<SubmissionStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewNote {
    pub note: Option<String>,
}

/// GET /api/admin/submissions?status=pending&page=&per_page=
///
/// Field admins see their own field; super admins see every field. Oldest first.
pub async fn submissions_get(
    Extension(user): Extension<CurrentUser>,
    ApiQuery(filter): ApiQuery<ReviewFilter>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Page<SubmissionWithUser>> {
    let scope = user.review_scope()?;
    let pool = DatabaseManager::pool().await?;
    let page = submissions::list_for_review(&pool, scope.as_deref(), filter.status, paging.window()).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/admin/submissions/:id/approve - `{"note": "optional"}`
///
/// The body may be empty; a body that is not valid JSON is a 400.
/// Promotes the submitter to alumni and copies field and batch year to the account.
pub async fn approve_post(
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    OptionalApiJson(payload): OptionalApiJson<ReviewNote>,
) -> ApiResult<Submission> {
    let note = clean_optional(payload.and_then(|body| body.note));
    let mut errors = FieldErrors::new();
    errors.max_len("note", note.as_deref(), MAX_LONG_TEXT_LEN);
    errors.into_result()?;

    let service = VerificationService::new().await?;
    let submission = service.review(&user, id, Decision::Approve, note.as_deref()).await?;
    Ok(ApiResponse::success(submission))
}

/// POST /api/admin/submissions/:id/reject - `{"note": "reason"}` (required)
pub async fn reject_post(
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<ReviewNote>,
) -> ApiResult<Submission> {
    let note = clean_optional(payload.note);
    let mut errors = FieldErrors::new();
    errors.check("note", note.is_some(), "A reason is required when rejecting");
    errors.max_len("note", note.as_deref(), MAX_LONG_TEXT_LEN);
    errors.into_result()?;

    let service = VerificationService::new().await?;
    let submission = service.review(&user, id, Decision::Reject, note.as_deref()).await?;
    Ok(ApiResponse::success(submission))
}
