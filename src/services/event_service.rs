use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::notification_service::{notify_event_attendees, notify_field_members};
use crate::api::{Page, PageWindow};
use crate::database::models::{Attendance, Attendee, Event, EventSummary};
use crate::database::repository::events::{self, EventChanges, EventVisibility, NewEvent};
use crate::database::repository::notifications::NewNotification;
use crate::database::repository::{attendance, fields};
use crate::database::{DatabaseError, DatabaseManager};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::types::{AttendanceStatus, NotificationKind};

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Event {0} not found")]
    NotFound(Uuid),
    #[error("Unknown field '{0}'")]
    UnknownField(String),
    #[error("You cannot manage events of {0}")]
    NotManaged(String),
    #[error("ends_at must not be before starts_at")]
    InvalidSchedule,
    #[error("Event is cancelled")]
    Cancelled,
    #[error("Event has already started")]
    Started,
    #[error("Event is full")]
    Full,
    #[error("Only managers of the field can list cancelled events")]
    CancelledListingDenied,
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::Database(e) => e.into(),
            EventError::NotFound(_) => ApiError::not_found(err.to_string()),
            EventError::UnknownField(_) => ApiError::invalid_field("field", err.to_string()),
            EventError::NotManaged(_) | EventError::CancelledListingDenied => ApiError::forbidden(err.to_string()),
            EventError::InvalidSchedule => ApiError::invalid_field("ends_at", err.to_string()),
            EventError::Cancelled | EventError::Started | EventError::Full => ApiError::conflict(err.to_string()),
        }
    }
}

/// Validated input for a new event; `field: None` means a global event
#[derive(Debug)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub field: Option<String>,
    pub capacity: Option<i32>,
}

#[derive(Debug, Default)]
pub struct EventListing {
    pub upcoming_only: bool,
    pub field: Option<String>,
    pub include_cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: EventSummary,
    pub counts: AttendanceCounts,
    pub my_status: Option<AttendanceStatus>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct AttendanceCounts {
    pub going: usize,
    pub maybe: usize,
    pub not_going: usize,
}

impl AttendanceCounts {
    pub fn tally(attendees: &[Attendee]) -> Self {
        let mut counts = Self::default();
        for attendee in attendees {
            match attendee.status {
                AttendanceStatus::Going => counts.going += 1,
                AttendanceStatus::Maybe => counts.maybe += 1,
                AttendanceStatus::NotGoing => counts.not_going += 1,
            }
        }
        counts
    }

    pub fn from_status_counts(rows: &[(AttendanceStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, n) in rows {
            let n = usize::try_from(*n).unwrap_or_default();
            match status {
                AttendanceStatus::Going => counts.going += n,
                AttendanceStatus::Maybe => counts.maybe += n,
                AttendanceStatus::NotGoing => counts.not_going += n,
            }
        }
        counts
    }
}

#[derive(Debug, Serialize)]
pub struct AttendanceReport {
    pub event_id: Uuid,
    pub counts: AttendanceCounts,
    pub attendees: Vec<Attendee>,
}

/// Reject a schedule that ends before it starts
pub fn check_schedule(starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> Result<(), EventError> {
    match ends_at {
        Some(end) if end < starts_at => Err(EventError::InvalidSchedule),
        _ => Ok(()),
    }
}

/// Global events are managed by super admins only
fn require_manager(user: &CurrentUser, event: &Event) -> Result<(), EventError> {
    let allowed = match event.field.as_deref() {
        Some(field) => user.manages_field(field),
        None => user.is_super_admin(),
    };
    if allowed {
        Ok(())
    } else {
        tracing::warn!("User {} denied management of event {}", user.id, event.id);
        Err(EventError::NotManaged(
            event.field.clone().unwrap_or_else(|| "global events".to_string()),
        ))
    }
}

pub struct EventService {
    pool: PgPool,
}

impl EventService {
    pub async fn new() -> Result<Self, EventError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn list(
        &self,
        user: &CurrentUser,
        listing: EventListing,
        window: PageWindow,
    ) -> Result<Page<EventSummary>, EventError> {
        if listing.include_cancelled {
            let allowed = user.is_super_admin()
                || listing.field.as_deref().map_or(false, |f| user.manages_field(f));
            if !allowed {
                return Err(EventError::CancelledListingDenied);
            }
        }

        let visibility = EventVisibility {
            viewer_field: user.field.clone(),
            managed_field: user.managed_field().map(str::to_string),
            all_fields: user.is_super_admin(),
            only_field: listing.field,
            upcoming_only: listing.upcoming_only,
            include_cancelled: listing.include_cancelled,
        };
        Ok(events::list(&self.pool, &visibility, window).await?)
    }

    /// Event with counts and the caller's RSVP; invisible events read as missing
    pub async fn detail(&self, user: &CurrentUser, event_id: Uuid) -> Result<EventDetail, EventError> {
        let event = events::find_summary(&self.pool, event_id)
            .await?
            .filter(|summary| user.can_see_field(summary.event.field.as_deref()))
            .ok_or(EventError::NotFound(event_id))?;
        let counts = AttendanceCounts::from_status_counts(&attendance::count_by_status(&self.pool, event_id).await?);
        let my_status = attendance::find(&self.pool, event_id, user.id)
            .await?
            .map(|rsvp| rsvp.status);
        Ok(EventDetail { event, counts, my_status })
    }

    pub async fn create(&self, user: &CurrentUser, draft: EventDraft) -> Result<Event, EventError> {
        check_schedule(draft.starts_at, draft.ends_at)?;

        // Field admins default to, and are limited to, their own field
        let field = match draft.field {
            Some(field) => Some(field),
            None if user.is_super_admin() => None,
            None => user.managed_field().map(str::to_string),
        };
        match field.as_deref() {
            Some(f) => {
                if !user.manages_field(f) {
                    return Err(EventError::NotManaged(f.to_string()));
                }
                if !fields::exists(&self.pool, f).await? {
                    return Err(EventError::UnknownField(f.to_string()));
                }
            }
            None if !user.is_super_admin() => {
                return Err(EventError::NotManaged("global events".to_string()));
            }
            None => {}
        }

        let event = events::insert(
            &self.pool,
            NewEvent {
                title: &draft.title,
                description: draft.description.as_deref(),
                location: draft.location.as_deref(),
                starts_at: draft.starts_at,
                ends_at: draft.ends_at,
                field: field.as_deref(),
                capacity: draft.capacity,
                created_by: user.id,
            },
        )
        .await?;

        tracing::info!("Event {} created by {} for {:?}", event.id, user.id, event.field);

        let notification = NewNotification::new(NotificationKind::EventCreated, format!("New event: {}", event.title))
            .body(event.starts_at.format("%Y-%m-%d %H:%M UTC").to_string())
            .link(format!("/api/events/{}", event.id));
        notify_field_members(&self.pool, event.field.as_deref(), user.id, notification).await;

        Ok(event)
    }

    pub async fn update(&self, user: &CurrentUser, event_id: Uuid, changes: EventChanges) -> Result<Event, EventError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let event = events::find_for_update(&mut *tx, event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))?;
        require_manager(user, &event)?;
        if event.is_cancelled {
            return Err(EventError::Cancelled);
        }
        check_schedule(
            changes.starts_at.unwrap_or(event.starts_at),
            changes.ends_at.or(event.ends_at),
        )?;

        let updated = events::update(&mut *tx, event_id, changes).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        tracing::info!("Event {} updated by {}", event_id, user.id);
        Ok(updated)
    }

    pub async fn cancel(&self, user: &CurrentUser, event_id: Uuid) -> Result<Event, EventError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let event = events::find_for_update(&mut *tx, event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))?;
        require_manager(user, &event)?;
        if event.is_cancelled {
            return Err(EventError::Cancelled);
        }

        let cancelled = events::cancel(&mut *tx, event_id).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        tracing::info!("Event {} cancelled by {}", event_id, user.id);

        let notification = NewNotification::new(
            NotificationKind::EventCancelled,
            format!("Event cancelled: {}", cancelled.title),
        )
        .link(format!("/api/events/{}", cancelled.id));
        notify_event_attendees(&self.pool, cancelled.id, notification).await;

        Ok(cancelled)
    }

    /// Record an RSVP. The event row stays locked while capacity is checked,
    /// so concurrent `going` responses cannot overfill it.
    pub async fn respond(
        &self,
        user: &CurrentUser,
        event_id: Uuid,
        status: AttendanceStatus,
    ) -> Result<Attendance, EventError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let event = events::find_for_update(&mut *tx, event_id)
            .await?
            .filter(|event| user.can_see_field(event.field.as_deref()))
            .ok_or(EventError::NotFound(event_id))?;
        if event.is_cancelled {
            return Err(EventError::Cancelled);
        }
        if event.has_started(Utc::now()) {
            return Err(EventError::Started);
        }

        if let (AttendanceStatus::Going, Some(capacity)) = (status, event.capacity) {
            let already_going = attendance::find(&mut *tx, event_id, user.id)
                .await?
                .map_or(false, |rsvp| rsvp.status == AttendanceStatus::Going);
            if !already_going && attendance::count_going(&mut *tx, event_id).await? >= i64::from(capacity) {
                return Err(EventError::Full);
            }
        }

        let rsvp = attendance::upsert(&mut *tx, event_id, user.id, status).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        tracing::debug!("User {} responded {} to event {}", user.id, status, event_id);
        Ok(rsvp)
    }

    pub async fn withdraw(&self, user: &CurrentUser, event_id: Uuid) -> Result<(), EventError> {
        events::find(&self.pool, event_id)
            .await?
            .filter(|event| user.can_see_field(event.field.as_deref()))
            .ok_or(EventError::NotFound(event_id))?;
        if attendance::delete(&self.pool, event_id, user.id).await? {
            tracing::debug!("User {} withdrew from event {}", user.id, event_id);
        }
        Ok(())
    }

    pub async fn attendance_report(&self, user: &CurrentUser, event_id: Uuid) -> Result<AttendanceReport, EventError> {
        let event = events::find(&self.pool, event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))?;
        require_manager(user, &event)?;

        let attendees = attendance::list_attendees(&self.pool, event_id).await?;
        Ok(AttendanceReport {
            event_id,
            counts: AttendanceCounts::tally(&attendees),
            attendees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::validate_user::test_user;
    use crate::types::Role;
    use chrono::Duration;

    fn event(field: Option<&str>) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: "Homecoming".into(),
            description: None,
            location: None,
            starts_at: now + Duration::days(7),
            ends_at: None,
            field: field.map(str::to_string),
            capacity: Some(50),
            created_by: Uuid::new_v4(),
            is_cancelled: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn attendee(status: AttendanceStatus) -> Attendee {
        Attendee {
            user_id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@example.org".into(),
            status,
            responded_at: Utc::now(),
        }
    }

    #[test]
    fn schedule_must_not_end_before_start() {
        let start = Utc::now();
        assert!(check_schedule(start, None).is_ok());
        assert!(check_schedule(start, Some(start)).is_ok());
        assert!(matches!(
            check_schedule(start, Some(start - Duration::hours(1))),
            Err(EventError::InvalidSchedule)
        ));
    }

    #[test]
    fn only_super_admin_manages_global_events() {
        let admin = test_user(Role::FieldAdmin, Some("Physics"), Some("Physics"));
        let root = test_user(Role::SuperAdmin, None, None);
        assert!(require_manager(&admin, &event(Some("Physics"))).is_ok());
        assert!(require_manager(&admin, &event(Some("Chemistry"))).is_err());
        assert!(require_manager(&admin, &event(None)).is_err());
        assert!(require_manager(&root, &event(None)).is_ok());
    }

    #[test]
    fn counts_tally_by_status() {
        let attendees = vec![
            attendee(AttendanceStatus::Going),
            attendee(AttendanceStatus::Going),
            attendee(AttendanceStatus::Maybe),
            attendee(AttendanceStatus::NotGoing),
        ];
        assert_eq!(
            AttendanceCounts::tally(&attendees),
            AttendanceCounts { going: 2, maybe: 1, not_going: 1 }
        );
    }

    #[test]
    fn grouped_counts_fill_missing_statuses_with_zero() {
        let counts = AttendanceCounts::from_status_counts(&[
            (AttendanceStatus::Going, 12),
            (AttendanceStatus::NotGoing, 3),
        ]);
        assert_eq!(counts, AttendanceCounts { going: 12, maybe: 0, not_going: 3 });
    }

    #[test]
    fn detail_serializes_counts_beside_the_event() {
        let detail = EventDetail {
            event: EventSummary { event: event(Some("Physics")), going_count: 2 },
            counts: AttendanceCounts { going: 2, maybe: 1, not_going: 0 },
            my_status: Some(AttendanceStatus::Maybe),
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["title"], "Homecoming");
        assert_eq!(json["counts"]["going"], 2);
        assert_eq!(json["counts"]["maybe"], 1);
        assert_eq!(json["counts"]["not_going"], 0);
        assert_eq!(json["my_status"], "maybe");
        assert!(json["starts_at"].as_str().is_some());
    }

    #[test]
    fn rsvp_conflicts_are_409() {
        for err in [EventError::Cancelled, EventError::Started, EventError::Full] {
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), axum::http::StatusCode::CONFLICT);
        }
    }
}
