// handlers/protected/events.rs - Event listing and RSVP (verified users)
//
// GET    /api/events
// GET    /api/events/:id
// PUT    /api/events/:id/attendance
// DELETE /api/events/:id/attendance

use axum::extract::{Extension, Path};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{ApiJson, ApiQuery, Page, PageParams};
use crate::database::models::{Attendance, EventSummary};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::event_service::{EventDetail, EventListing};
use crate::services::EventService;
use crate::types::AttendanceStatus;

#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub upcoming: Option<bool>,
    pub field: Option<String>,
    pub include_cancelled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AttendancePayload {
    pub status: AttendanceStatus,
}

/// GET /api/events?upcoming=&field=&include_cancelled=&page=&per_page=
///
/// Events visible to the caller, soonest first, each with its `going_count`.
pub async fn events_get(
    Extension(user): Extension<CurrentUser>,
    ApiQuery(filter): ApiQuery<EventFilter>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Page<EventSummary>> {
    let listing = EventListing {
        upcoming_only: filter.upcoming.unwrap_or(false),
        field: filter.field.filter(|f| !f.trim().is_empty()),
        include_cancelled: filter.include_cancelled.unwrap_or(false),
    };
    let service = EventService::new().await?;
    Ok(ApiResponse::success(service.list(&user, listing, paging.window()).await?))
}

/// GET /api/events/:id - Event, counts and the caller's own RSVP (`my_status`)
pub async fn event_get(Extension(user): Extension<CurrentUser>, Path(id): Path<Uuid>) -> ApiResult<EventDetail> {
    let service = EventService::new().await?;
    Ok(ApiResponse::success(service.detail(&user, id).await?))
}

/// PUT /api/events/:id/attendance - RSVP `{"status": "going" | "maybe" | "not_going"}`
///
/// 409 when the event is cancelled, has started, or is full.
pub async fn attendance_put(
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<AttendancePayload>,
) -> ApiResult<Attendance> {
    let service = EventService::new().await?;
    Ok(ApiResponse::success(service.respond(&user, id, payload.status).await?))
}

/// DELETE /api/events/:id/attendance - Withdraw the RSVP
pub async fn attendance_delete(Extension(user): Extension<CurrentUser>, Path(id): Path<Uuid>) -> ApiResult<()> {
    let service = EventService::new().await?;
    service.withdraw(&user, id).await?;
    Ok(ApiResponse::no_content())
}
