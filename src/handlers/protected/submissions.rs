// handlers/protected/submissions.rs - Verification requests
//
// POST /api/submissions
// GET  /api/submissions

use axum::extract::Extension;
use serde::Deserialize;

use crate::api::validation::{clean_optional, is_valid_batch_year, FieldErrors, MAX_LONG_TEXT_LEN, MAX_SHORT_TEXT_LEN};
use crate::api::ApiJson;
use crate::database::models::Submission;
use crate::database::repository::submissions;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::verification_service::SubmissionRequest;
use crate::services::VerificationService;

#[derive(Debug, Deserialize)]
pub struct SubmissionPayload {
    pub field: String,
    pub batch_year: i32,
    pub roll_number: String,
    pub note: Option<String>,
}

impl SubmissionPayload {
    fn into_request(self) -> Result<SubmissionRequest, ApiError> {
        let field = self.field.trim().to_string();
        let roll_number = self.roll_number.trim().to_string();
        let note = clean_optional(self.note);

        let mut errors = FieldErrors::new();
        errors.check("field", !field.is_empty(), "Field is required");
        errors.check("batch_year", is_valid_batch_year(self.batch_year), "Batch year is out of range");
        errors.check("roll_number", !roll_number.is_empty(), "Roll number is required");
        errors.max_len("roll_number", Some(&roll_number), MAX_SHORT_TEXT_LEN);
        errors.max_len("note", note.as_deref(), MAX_LONG_TEXT_LEN);
        errors.into_result()?;

        Ok(SubmissionRequest {
            field,
            batch_year: self.batch_year,
            roll_number,
            note,
        })
    }
}

/// POST /api/submissions - Ask the field admin to verify this account
///
/// ```json
/// { "field": "Physics", "batch_year": 2015, "roll_number": "PH-15-042", "note": "optional" }
/// ```
///
/// 201 on success, 403 for accounts that are already verified,
/// 409 while another submission is pending.
pub async fn submission_post(
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<SubmissionPayload>,
) -> ApiResult<Submission> {
    let request = payload.into_request()?;
    let service = VerificationService::new().await?;
    let submission = service.submit(&user, request).await?;
    Ok(ApiResponse::created(submission))
}

/// GET /api/submissions - Own submissions, newest first
pub async fn submissions_get(Extension(user): Extension<CurrentUser>) -> ApiResult<Vec<Submission>> {
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(submissions::list_for_user(&pool, user.id).await?))
}
