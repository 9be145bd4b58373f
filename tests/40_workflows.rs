// Service-level workflows against a real Postgres (DATABASE_URL).
// Each test creates its own fields and users, so runs do not collide.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use alumni_api::api::PageWindow;
use alumni_api::database::models::User;
use alumni_api::database::repository::users::NewUser;
use alumni_api::database::repository::{field_admins, fields, notifications, profiles, users};
use alumni_api::database::{DatabaseError, DatabaseManager};
use alumni_api::error::ApiError;
use alumni_api::middleware::CurrentUser;
use alumni_api::services::event_service::EventDraft;
use alumni_api::services::verification_service::{Decision, SubmissionRequest};
use alumni_api::services::{
    EventError, EventService, FieldAdminError, FieldAdminService, UserService, VerificationError,
    VerificationService,
};
use alumni_api::types::{AttendanceStatus, Role};

async fn pool() -> PgPool {
    DatabaseManager::pool().await.expect("database pool")
}

async fn new_field(pool: &PgPool) -> String {
    let name = format!("Field {}", &Uuid::new_v4().simple().to_string()[..12]);
    fields::insert(pool, &name, None).await.expect("insert field");
    name
}

async fn new_user(pool: &PgPool, role: Role, field: Option<&str>) -> User {
    let email = format!("{}@example.org", Uuid::new_v4().simple());
    let user = users::insert(
        pool,
        NewUser {
            name: "Test Alumnus",
            email: &email,
            password_hash: "not-a-real-hash",
            role,
            field,
            batch_year: field.map(|_| 2012),
        },
    )
    .await
    .expect("insert user");
    profiles::create_empty(pool, user.id).await.expect("insert profile");
    user
}

async fn reload(pool: &PgPool, id: Uuid) -> User {
    users::find_by_id(pool, id).await.expect("load user").expect("user exists")
}

/// What the user middleware would build for this account
async fn current(pool: &PgPool, id: Uuid) -> CurrentUser {
    let user = reload(pool, id).await;
    let administered_field = field_admins::active_field_for_user(pool, id).await.expect("load assignment");
    CurrentUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        field: user.field,
        batch_year: user.batch_year,
        administered_field,
    }
}

#[test]
fn reassignment_promotes_target_and_demotes_previous_admin() {
    common::block_on(async {
        if !common::database_ready().await {
            return;
        }
        let pool = pool().await;
        let service = FieldAdminService::new().await.unwrap();
        let field = new_field(&pool).await;
        let first = new_user(&pool, Role::Alumni, Some(&field)).await;
        let second = new_user(&pool, Role::Alumni, Some(&field)).await;

        let assigned = service.assign(&field, first.id, None).await.unwrap();
        assert!(assigned.changed);
        assert_eq!(assigned.previous_admin, None);
        assert_eq!(reload(&pool, first.id).await.role, Role::FieldAdmin);

        let again = service.assign(&field, first.id, None).await.unwrap();
        assert!(!again.changed);
        assert_eq!(again.assignment.id, assigned.assignment.id);

        let replaced = service.assign(&field, second.id, None).await.unwrap();
        assert!(replaced.changed);
        assert_eq!(replaced.previous_admin, Some(first.id));
        assert_eq!(reload(&pool, first.id).await.role, Role::Alumni);
        assert_eq!(reload(&pool, second.id).await.role, Role::FieldAdmin);
        assert_eq!(field_admins::active_admin_of(&pool, &field).await.unwrap(), Some(second.id));
    });
}

#[test]
fn failed_reassignment_rolls_back_previous_admin() {
    common::block_on(async {
        if !common::database_ready().await {
            return;
        }
        let pool = pool().await;
        let service = FieldAdminService::new().await.unwrap();
        let field = new_field(&pool).await;
        let other_field = new_field(&pool).await;
        let admin = new_user(&pool, Role::Alumni, Some(&field)).await;
        let pending = new_user(&pool, Role::Unverified, Some(&field)).await;
        let outsider = new_user(&pool, Role::Alumni, Some(&other_field)).await;
        service.assign(&field, admin.id, None).await.unwrap();

        let err = service.assign(&field, pending.id, None).await.unwrap_err();
        assert!(matches!(err, FieldAdminError::UserUnverified), "{err}");

        let err = service.assign(&field, outsider.id, None).await.unwrap_err();
        assert!(matches!(err, FieldAdminError::FieldMismatch { .. }), "{err}");
        assert_eq!(ApiError::from(err).status_code(), StatusCode::BAD_REQUEST);

        // The previous admin's deactivation and demotion were rolled back
        assert_eq!(field_admins::active_admin_of(&pool, &field).await.unwrap(), Some(admin.id));
        assert_eq!(reload(&pool, admin.id).await.role, Role::FieldAdmin);
        assert_eq!(reload(&pool, outsider.id).await.role, Role::Alumni);
        assert_eq!(reload(&pool, pending.id).await.role, Role::Unverified);
    });
}

#[test]
fn removal_keeps_role_while_another_assignment_is_active() {
    common::block_on(async {
        if !common::database_ready().await {
            return;
        }
        let pool = pool().await;
        let service = FieldAdminService::new().await.unwrap();
        let field = new_field(&pool).await;
        let second_field = new_field(&pool).await;
        let admin = new_user(&pool, Role::Alumni, Some(&field)).await;
        service.assign(&field, admin.id, None).await.unwrap();
        // Only reachable through direct data changes; removal must still respect it
        field_admins::activate(&pool, &second_field, admin.id, None).await.unwrap();

        service.remove(&field).await.unwrap();
        assert_eq!(reload(&pool, admin.id).await.role, Role::FieldAdmin);
        assert_eq!(field_admins::active_admin_of(&pool, &field).await.unwrap(), None);

        service.remove(&second_field).await.unwrap();
        assert_eq!(reload(&pool, admin.id).await.role, Role::Alumni);

        let err = service.remove(&field).await.unwrap_err();
        assert!(matches!(err, FieldAdminError::NoActiveAdmin(_)), "{err}");
    });
}

#[test]
fn approval_promotes_submitter_and_pending_is_unique() {
    common::block_on(async {
        if !common::database_ready().await {
            return;
        }
        let pool = pool().await;
        let field = new_field(&pool).await;
        let other_field = new_field(&pool).await;
        let admin = new_user(&pool, Role::Alumni, Some(&field)).await;
        let other_admin = new_user(&pool, Role::Alumni, Some(&other_field)).await;
        let applicant = new_user(&pool, Role::Unverified, None).await;

        let assignments = FieldAdminService::new().await.unwrap();
        assignments.assign(&field, admin.id, None).await.unwrap();
        assignments.assign(&other_field, other_admin.id, None).await.unwrap();

        let service = VerificationService::new().await.unwrap();
        let request = || SubmissionRequest {
            field: field.clone(),
            batch_year: 2014,
            roll_number: "PH-2014-042".into(),
            note: None,
        };
        let applicant_view = current(&pool, applicant.id).await;
        let submission = service.submit(&applicant_view, request()).await.unwrap();

        let err = service.submit(&applicant_view, request()).await.unwrap_err();
        assert!(
            matches!(err, VerificationError::Database(DatabaseError::UniqueViolation(_))),
            "{err}"
        );
        assert_eq!(ApiError::from(err).status_code(), StatusCode::CONFLICT);

        let err = service
            .review(&current(&pool, other_admin.id).await, submission.id, Decision::Approve, None)
            .await
            .unwrap_err();
        assert!(matches!(err, VerificationError::NotManaged(_)), "{err}");

        let approved = service
            .review(&current(&pool, admin.id).await, submission.id, Decision::Approve, Some("Welcome"))
            .await
            .unwrap();
        assert_eq!(approved.reviewed_by, Some(admin.id));

        let promoted = reload(&pool, applicant.id).await;
        assert_eq!(promoted.role, Role::Alumni);
        assert_eq!(promoted.field.as_deref(), Some(field.as_str()));
        assert_eq!(promoted.batch_year, Some(2014));

        let err = service
            .review(&current(&pool, admin.id).await, submission.id, Decision::Reject, Some("late"))
            .await
            .unwrap_err();
        assert!(matches!(err, VerificationError::NotPending(_)), "{err}");
    });
}

#[test]
fn going_is_refused_once_capacity_is_reached() {
    common::block_on(async {
        if !common::database_ready().await {
            return;
        }
        let pool = pool().await;
        let field = new_field(&pool).await;
        let root = new_user(&pool, Role::SuperAdmin, None).await;
        let first = new_user(&pool, Role::Alumni, Some(&field)).await;
        let second = new_user(&pool, Role::Alumni, Some(&field)).await;

        let service = EventService::new().await.unwrap();
        let event = service
            .create(
                &current(&pool, root.id).await,
                EventDraft {
                    title: "Reunion dinner".into(),
                    description: None,
                    location: Some("Main hall".into()),
                    starts_at: Utc::now() + Duration::days(3),
                    ends_at: None,
                    field: Some(field.clone()),
                    capacity: Some(1),
                },
            )
            .await
            .unwrap();

        let first_view = current(&pool, first.id).await;
        let second_view = current(&pool, second.id).await;
        service.respond(&first_view, event.id, AttendanceStatus::Going).await.unwrap();
        // Re-confirming an existing seat is not a new seat
        service.respond(&first_view, event.id, AttendanceStatus::Going).await.unwrap();

        let err = service
            .respond(&second_view, event.id, AttendanceStatus::Going)
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::Full), "{err}");
        assert_eq!(ApiError::from(err).status_code(), StatusCode::CONFLICT);

        service.respond(&second_view, event.id, AttendanceStatus::Maybe).await.unwrap();

        let detail = service.detail(&second_view, event.id).await.unwrap();
        assert_eq!(detail.counts.going, 1);
        assert_eq!(detail.counts.maybe, 1);
        assert_eq!(detail.counts.not_going, 0);
        assert_eq!(detail.my_status, Some(AttendanceStatus::Maybe));
    });
}

/// Whether the user holds a notification pointing at `link`
async fn notified(pool: &PgPool, user_id: Uuid, link: &str) -> bool {
    let window = PageWindow { page: 1, per_page: 100 };
    notifications::list_for_user(pool, user_id, false, window)
        .await
        .expect("list notifications")
        .items
        .iter()
        .any(|n| n.link.as_deref() == Some(link))
}

#[test]
fn field_event_notifies_members_and_super_admins() {
    common::block_on(async {
        if !common::database_ready().await {
            return;
        }
        let pool = pool().await;
        let field = new_field(&pool).await;
        let other_field = new_field(&pool).await;
        let admin = new_user(&pool, Role::Alumni, Some(&field)).await;
        let member = new_user(&pool, Role::Alumni, Some(&field)).await;
        let outsider = new_user(&pool, Role::Alumni, Some(&other_field)).await;
        let pending = new_user(&pool, Role::Unverified, Some(&field)).await;
        let root = new_user(&pool, Role::SuperAdmin, None).await;
        FieldAdminService::new().await.unwrap().assign(&field, admin.id, None).await.unwrap();

        let event = EventService::new()
            .await
            .unwrap()
            .create(
                &current(&pool, admin.id).await,
                EventDraft {
                    title: "Lab open day".into(),
                    description: None,
                    location: None,
                    starts_at: Utc::now() + Duration::days(10),
                    ends_at: None,
                    field: None,
                    capacity: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(event.field.as_deref(), Some(field.as_str()));

        let link = format!("/api/events/{}", event.id);
        assert!(notified(&pool, member.id, &link).await);
        assert!(notified(&pool, root.id, &link).await);
        assert!(!notified(&pool, admin.id, &link).await);
        assert!(!notified(&pool, outsider.id, &link).await);
        assert!(!notified(&pool, pending.id, &link).await);
    });
}

#[test]
fn deactivating_a_field_admin_revokes_the_assignment() {
    common::block_on(async {
        if !common::database_ready().await {
            return;
        }
        let pool = pool().await;
        let field = new_field(&pool).await;
        let root = new_user(&pool, Role::SuperAdmin, None).await;
        let admin = new_user(&pool, Role::Alumni, Some(&field)).await;
        FieldAdminService::new().await.unwrap().assign(&field, admin.id, None).await.unwrap();

        let service = UserService::new().await.unwrap();
        let deactivated = service.deactivate(root.id, admin.id).await.unwrap();
        assert!(!deactivated.is_active);
        assert_eq!(deactivated.role, Role::Alumni);
        assert_eq!(field_admins::active_admin_of(&pool, &field).await.unwrap(), None);

        let reactivated = service.activate(root.id, admin.id).await.unwrap();
        assert!(reactivated.is_active);
        assert_eq!(reactivated.role, Role::Alumni);

        assert!(service.deactivate(root.id, root.id).await.is_err());
    });
}
