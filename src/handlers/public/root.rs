// handlers/public/root.rs - GET /, GET /health

use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;

/// GET / - Service name, version and endpoint map
pub async fn root_get() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Alumni Directory API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/register, /auth/login (public - token acquisition)",
                "fields": "/api/fields (public)",
                "media": "/media/*key (public)",
                "session": "/api/auth/* (protected)",
                "profile": "/api/profile[/photo] (protected)",
                "submissions": "/api/submissions (protected)",
                "directory": "/api/directory, /api/users/:id, /api/batchmates (verified)",
                "events": "/api/events[/:id[/attendance]] (verified)",
                "notifications": "/api/notifications/* (protected)",
                "admin": "/api/admin/* (field admin)",
                "root": "/api/root/* (super admin)"
            }
        }
    }))
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health_get() -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": e.to_string()
                    }
                })),
            )
        }
    }
}
