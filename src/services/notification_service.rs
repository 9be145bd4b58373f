//! Notification delivery. Runs after the triggering change has committed;
//! a failed insert is logged and never fails the caller.

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::repository::notifications::{self, NewNotification};
use crate::types::NotificationKind;

impl NewNotification {
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: None,
            link: None,
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

pub async fn notify_user(pool: &PgPool, user_id: Uuid, notification: NewNotification) {
    if let Err(e) = notifications::insert(pool, user_id, &notification).await {
        tracing::error!("Failed to notify user {} ({}): {}", user_id, notification.kind, e);
    }
}

/// Notify every active verified member of `field` (`None` = all members)
pub async fn notify_field_members(
    pool: &PgPool,
    field: Option<&str>,
    skip_user: Uuid,
    notification: NewNotification,
) {
    match notifications::insert_for_field_members(pool, field, skip_user, &notification).await {
        Ok(count) => tracing::info!(
            "Sent {} notification to {} members of {}",
            notification.kind,
            count,
            field.unwrap_or("all fields")
        ),
        Err(e) => tracing::error!("Failed to notify members of {:?}: {}", field, e),
    }
}

pub async fn notify_event_attendees(pool: &PgPool, event_id: Uuid, notification: NewNotification) {
    match notifications::insert_for_event_attendees(pool, event_id, &notification).await {
        Ok(count) => tracing::info!("Sent {} notification to {} attendees of {}", notification.kind, count, event_id),
        Err(e) => tracing::error!("Failed to notify attendees of {}: {}", event_id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_parts() {
        let n = NewNotification::new(NotificationKind::EventCreated, "Reunion")
            .body("Saturday at the quad")
            .link("/api/events/1");
        assert_eq!(n.title, "Reunion");
        assert_eq!(n.body.as_deref(), Some("Saturday at the quad"));
        assert_eq!(n.link.as_deref(), Some("/api/events/1"));
    }
}
