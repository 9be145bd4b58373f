// handlers/public/auth.rs - POST /auth/register, POST /auth/login
//
// Token acquisition. Both endpoints return the same session payload as
// POST /api/auth/refresh.

use serde::{Deserialize, Serialize};

use crate::api::validation::{is_valid_batch_year, is_valid_email, normalize_email, FieldErrors, MAX_NAME_LEN};
use crate::api::ApiJson;
use crate::auth::{generate_jwt, hash_password_blocking, verify_password_blocking, Claims};
use crate::config;
use crate::database::models::User;
use crate::database::repository::users::NewUser;
use crate::database::repository::{fields, profiles, users};
use crate::database::{DatabaseError, DatabaseManager};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub field: Option<String>,
    pub batch_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token plus the account it was issued for
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

impl SessionResponse {
    pub fn issue(user: User) -> Result<Self, ApiError> {
        let claims = Claims::new(user.id, user.email.clone(), user.role);
        let token = generate_jwt(&claims)?;
        Ok(Self {
            token,
            expires_in: claims.expires_in(),
            user,
        })
    }
}

/// Password length rule shared with PUT /api/auth/password
pub fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
    let min = config::config().security.min_password_length;
    errors.check(
        field,
        password.chars().count() >= min,
        &format!("Password must be at least {} characters", min),
    );
}

/// POST /auth/register - Create an unverified account and return a session
///
/// Expected Input:
/// ```json
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.org",
///   "password": "at least the configured minimum",
///   "field": "Mathematics",   // optional, must exist
///   "batch_year": 2015        // optional
/// }
/// ```
///
/// Responds 201 with `{token, expires_in, user}`.
pub async fn register_post(ApiJson(payload): ApiJson<RegisterRequest>) -> ApiResult<SessionResponse> {
    if !config::config().security.allow_registration {
        return Err(ApiError::forbidden("Registration is disabled"));
    }

    let name = payload.name.trim();
    let email = normalize_email(&payload.email);
    let field = payload.field.as_deref().map(str::trim).filter(|f| !f.is_empty());

    let mut errors = FieldErrors::new();
    errors.check("name", !name.is_empty(), "Name is required");
    errors.max_len("name", Some(name), MAX_NAME_LEN);
    errors.check("email", is_valid_email(&email), "Invalid email address");
    check_password(&mut errors, "password", &payload.password);
    if let Some(year) = payload.batch_year {
        errors.check("batch_year", is_valid_batch_year(year), "Batch year is out of range");
    }
    errors.into_result()?;

    let pool = DatabaseManager::pool().await?;

    if let Some(field) = field {
        if !fields::exists(&pool, field).await? {
            return Err(ApiError::invalid_field("field", format!("Unknown field '{}'", field)));
        }
    }

    let password_hash = hash_password_blocking(payload.password.clone()).await?;

    let mut tx = pool.begin().await.map_err(DatabaseError::from)?;
    let user = users::insert(
        &mut *tx,
        NewUser {
            name,
            email: &email,
            password_hash: &password_hash,
            role: Role::Unverified,
            field,
            batch_year: payload.batch_year,
        },
    )
    .await?;
    profiles::create_empty(&mut *tx, user.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    tracing::info!("Registered user {} ({})", user.id, user.email);

    Ok(ApiResponse::created(SessionResponse::issue(user)?))
}

/// POST /auth/login - Authenticate with email and password
///
/// Unknown emails and wrong passwords get the same 401 response.
pub async fn login_post(ApiJson(payload): ApiJson<LoginRequest>) -> ApiResult<SessionResponse> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let pool = DatabaseManager::pool().await?;

    let user = users::find_by_email(&pool, &email).await?;
    // Unknown emails verify against a dummy hash so both failures cost the same
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let verified = verify_password_blocking(payload.password, stored_hash).await?;
    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::warn!("Failed login attempt for {}", email);
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
    };

    if !user.is_active {
        tracing::warn!("Login refused for deactivated account {}", user.id);
        return Err(ApiError::forbidden("Account is deactivated"));
    }

    tracing::info!("User {} logged in", user.id);
    Ok(ApiResponse::success(SessionResponse::issue(user)?))
}
