use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::types::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, role: Role) -> Self {
        let expiry_hours = config::config().security.jwt_expiry_hours;
        Self::with_expiry(user_id, email, role, expiry_hours)
    }

    pub fn with_expiry(user_id: Uuid, email: String, role: Role, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            email,
            role,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn expires_in(&self) -> i64 {
        self.exp - Utc::now().timestamp()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    generate_jwt_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn generate_jwt_with_secret(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str) -> Result<Claims, AuthError> {
    validate_jwt_with_secret(token, &config::config().security.jwt_secret)
}

pub fn validate_jwt_with_secret(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

/// Stand-in hash checked when an account does not exist, so a login for an
/// unknown email spends the same argon2 work as one with a wrong password
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("alumni-api-timing-equalizer").ok());

/// Compute the dummy hash ahead of the first failed login
pub fn prepare_dummy_hash() {
    Lazy::force(&DUMMY_HASH);
}

/// `hash_password` on the blocking thread pool
pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
}

/// `verify_password` on the blocking thread pool. Without a stored hash the
/// dummy hash is verified instead and the result is always false.
pub async fn verify_password_blocking(password: String, password_hash: Option<String>) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || match password_hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&password, dummy);
            }
            false
        }
    })
    .await
    .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trip_keeps_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::with_expiry(user_id, "ada@example.org".into(), Role::Alumni, 1);
        let token = generate_jwt_with_secret(&claims, SECRET).unwrap();

        let decoded = validate_jwt_with_secret(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.role, Role::Alumni);
        assert!(decoded.expires_in() > 0);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::with_expiry(Uuid::new_v4(), "a@b.org".into(), Role::Unverified, 1);
        let token = generate_jwt_with_secret(&claims, SECRET).unwrap();
        assert!(matches!(
            validate_jwt_with_secret(&token, "other-secret"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = Claims::with_expiry(Uuid::new_v4(), "a@b.org".into(), Role::Alumni, 1);
        claims.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt_with_secret(&claims, SECRET).unwrap();
        assert!(validate_jwt_with_secret(&token, SECRET).is_err());
    }

    #[test]
    fn empty_secret_refuses() {
        let claims = Claims::with_expiry(Uuid::new_v4(), "a@b.org".into(), Role::Alumni, 1);
        assert!(matches!(generate_jwt_with_secret(&claims, ""), Err(AuthError::MissingSecret)));
        assert!(matches!(validate_jwt_with_secret("x.y.z", ""), Err(AuthError::MissingSecret)));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn blocking_helpers_match_sync_versions() {
        let hash = hash_password_blocking("correct horse battery".into()).await.unwrap();
        assert!(verify_password_blocking("correct horse battery".into(), Some(hash.clone())).await.unwrap());
        assert!(!verify_password_blocking("wrong".into(), Some(hash)).await.unwrap());
    }

    #[tokio::test]
    async fn missing_account_still_runs_a_verification() {
        prepare_dummy_hash();
        assert!(DUMMY_HASH.as_deref().map_or(false, |h| h.starts_with("$argon2")));
        assert!(!verify_password_blocking("alumni-api-timing-equalizer".into(), None).await.unwrap());
    }
}
