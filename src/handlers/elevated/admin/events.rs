// handlers/elevated/admin/events.rs - Event management
//
// POST /api/admin/events
// PUT  /api/admin/events/:id
// POST /api/admin/events/:id/cancel
// GET  /api/admin/events/:id/attendance

use axum::extract::{Extension, Path};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::validation::{clean_optional, FieldErrors, MAX_LONG_TEXT_LEN, MAX_SHORT_TEXT_LEN};
use crate::api::ApiJson;
use crate::database::models::Event;
use crate::database::repository::events::EventChanges;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::event_service::{AttendanceReport, EventDraft};
use crate::services::EventService;

#[derive(Debug, Deserialize)]
pub struct EventPayload {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub field: Option<String>,
    pub capacity: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
}

fn check_text(errors: &mut FieldErrors, title: Option<&str>, description: Option<&str>, location: Option<&str>) {
    errors.max_len("title", title, MAX_SHORT_TEXT_LEN);
    errors.max_len("description", description, MAX_LONG_TEXT_LEN);
    errors.max_len("location", location, MAX_SHORT_TEXT_LEN);
}

fn check_capacity(errors: &mut FieldErrors, capacity: Option<i32>) {
    if let Some(capacity) = capacity {
        errors.check("capacity", capacity > 0, "Capacity must be positive");
    }
}

impl EventPayload {
    fn into_draft(self) -> Result<EventDraft, crate::error::ApiError> {
        let title = self.title.trim().to_string();
        let description = clean_optional(self.description);
        let location = clean_optional(self.location);

        let mut errors = FieldErrors::new();
        errors.check("title", !title.is_empty(), "Title is required");
        check_text(&mut errors, Some(&title), description.as_deref(), location.as_deref());
        check_capacity(&mut errors, self.capacity);
        errors.into_result()?;

        Ok(EventDraft {
            title,
            description,
            location,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            field: clean_optional(self.field),
            capacity: self.capacity,
        })
    }
}

impl EventUpdate {
    fn into_changes(self) -> Result<EventChanges, crate::error::ApiError> {
        let title = self.title.map(|t| t.trim().to_string());

        let mut errors = FieldErrors::new();
        if let Some(title) = &title {
            errors.check("title", !title.is_empty(), "Title cannot be empty");
        }
        check_text(&mut errors, title.as_deref(), self.description.as_deref(), self.location.as_deref());
        check_capacity(&mut errors, self.capacity);
        errors.into_result()?;

        Ok(EventChanges {
            title,
            description: self.description,
            location: self.location,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            capacity: self.capacity,
        })
    }
}

/// POST /api/admin/events - Create an event
///
/// ```json
/// {
///   "title": "Class of 2015 reunion",
///   "starts_at": "2026-06-01T17:00:00Z",
///   "ends_at": "2026-06-01T22:00:00Z",   // optional
///   "field": "Physics",                  // optional; null = global (super admin)
///   "capacity": 120                      // optional
/// }
/// ```
pub async fn event_post(
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<EventPayload>,
) -> ApiResult<Event> {
    let draft = payload.into_draft()?;
    let service = EventService::new().await?;
    Ok(ApiResponse::created(service.create(&user, draft).await?))
}

/// PUT /api/admin/events/:id - Partial update; absent keys keep their value
pub async fn event_put(
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<EventUpdate>,
) -> ApiResult<Event> {
    let changes = payload.into_changes()?;
    let service = EventService::new().await?;
    Ok(ApiResponse::success(service.update(&user, id, changes).await?))
}

/// POST /api/admin/events/:id/cancel - Cancel and notify everyone going
pub async fn cancel_post(Extension(user): Extension<CurrentUser>, Path(id): Path<Uuid>) -> ApiResult<Event> {
    let service = EventService::new().await?;
    Ok(ApiResponse::success(service.cancel(&user, id).await?))
}

/// GET /api/admin/events/:id/attendance - Attendees with per-status counts
pub async fn attendance_get(
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<AttendanceReport> {
    let service = EventService::new().await?;
    Ok(ApiResponse::success(service.attendance_report(&user, id).await?))
}
