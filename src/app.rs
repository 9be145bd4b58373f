//! HTTP router: the three handler tiers plus global layers.

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::{self, AppConfig};
use crate::handlers::{elevated, protected, public};
use crate::middleware::{
    jwt_auth_middleware, require_field_admin, require_super_admin, require_verified, validate_user_middleware,
};

pub fn app() -> Router {
    let settings = config::config();

    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .layer(DefaultBodyLimit::max(settings.api.max_request_size_bytes))
        .layer(RequestBodyLimitLayer::new(settings.api.max_request_size_bytes));

    let router = match cors_layer(settings) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    if settings.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn cors_layer(settings: &AppConfig) -> Option<CorsLayer> {
    if !settings.security.enable_cors {
        return None;
    }

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let origins = &settings.security.cors_origins;
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Some(base.allow_origin(Any));
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    Some(base.allow_origin(allowed))
}

fn public_routes() -> Router {
    Router::new()
        .route("/", get(public::root::root_get))
        .route("/health", get(public::root::health_get))
        .route("/auth/register", post(public::auth::register_post))
        .route("/auth/login", post(public::auth::login_post))
        .route("/api/fields", get(public::fields::list_get))
        .route("/media/*key", get(public::media::object_get))
}

/// Everything under /api that needs a token. The JWT layer runs first, then
/// the account is loaded, then the per-group role guard.
fn protected_routes() -> Router {
    Router::new()
        .merge(account_routes())
        .merge(verified_routes().route_layer(from_fn(require_verified)))
        .merge(admin_routes().route_layer(from_fn(require_field_admin)))
        .merge(root_routes().route_layer(from_fn(require_super_admin)))
        .route_layer(from_fn(validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

/// Available to every active account, verified or not
fn account_routes() -> Router {
    use protected::{notifications, profile, session, submissions};

    Router::new()
        .route("/api/auth/whoami", get(session::whoami_get))
        .route("/api/auth/refresh", post(session::refresh_post))
        .route("/api/auth/password", put(session::password_put))
        .route("/api/profile", get(profile::profile_get).put(profile::profile_put))
        .route("/api/profile/photo", post(profile::photo_post).delete(profile::photo_delete))
        .route(
            "/api/submissions",
            get(submissions::submissions_get).post(submissions::submission_post),
        )
        .route("/api/notifications", get(notifications::notifications_get))
        .route("/api/notifications/unread-count", get(notifications::unread_count_get))
        .route("/api/notifications/read-all", post(notifications::read_all_post))
        .route("/api/notifications/:id", axum::routing::delete(notifications::notification_delete))
        .route("/api/notifications/:id/read", post(notifications::read_post))
}

fn verified_routes() -> Router {
    use protected::{directory, events};

    Router::new()
        .route("/api/directory", get(directory::directory_get))
        .route("/api/users/:id", get(directory::user_get))
        .route("/api/batchmates", get(directory::batchmates_get))
        .route("/api/events", get(events::events_get))
        .route("/api/events/:id", get(events::event_get))
        .route(
            "/api/events/:id/attendance",
            put(events::attendance_put).delete(events::attendance_delete),
        )
}

fn admin_routes() -> Router {
    use elevated::admin::{events, submissions, users};

    Router::new()
        .route("/api/admin/submissions", get(submissions::submissions_get))
        .route("/api/admin/submissions/:id/approve", post(submissions::approve_post))
        .route("/api/admin/submissions/:id/reject", post(submissions::reject_post))
        .route("/api/admin/users", get(users::users_get))
        .route("/api/admin/events", post(events::event_post))
        .route("/api/admin/events/:id", put(events::event_put))
        .route("/api/admin/events/:id/cancel", post(events::cancel_post))
        .route("/api/admin/events/:id/attendance", get(events::attendance_get))
}

fn root_routes() -> Router {
    use elevated::root::{field_admins, fields, users};

    Router::new()
        .route("/api/root/fields", post(fields::field_post))
        .route("/api/root/fields/:name", axum::routing::delete(fields::field_delete))
        .route("/api/root/field-admins", get(field_admins::field_admins_get))
        .route(
            "/api/root/field-admins/:field",
            put(field_admins::field_admin_put).delete(field_admins::field_admin_delete),
        )
        .route("/api/root/users/:id/deactivate", post(users::deactivate_post))
        .route("/api/root/users/:id/activate", post(users::activate_post))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn root_lists_endpoints() {
        let (status, body) = send(get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Alumni Directory API");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/profile", "/api/directory", "/api/admin/submissions", "/api/root/field-admins"] {
            let (status, body) = send(get_request(uri)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(body["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let request = Request::builder()
            .uri("/api/auth/whoami")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn register_validates_before_touching_the_database() {
        let request = json_request(
            Method::POST,
            "/auth/register",
            json!({"name": " ", "email": "nope", "password": "short"}),
        );
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["field_errors"]["name"].is_string());
        assert!(body["field_errors"]["email"].is_string());
        assert!(body["field_errors"]["password"].is_string());
    }

    #[tokio::test]
    async fn malformed_json_uses_the_error_envelope() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn media_rejects_traversal() {
        let (status, _) = send(get_request("/media/photos/../../etc/passwd")).await;
        assert!(status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND);
    }
}
