// handlers/protected/profile.rs - Own profile and photo
//
// GET    /api/profile
// PUT    /api/profile
// POST   /api/profile/photo   (multipart, field "photo")
// DELETE /api/profile/photo

use axum::extract::{Extension, Multipart};
use serde::{Deserialize, Serialize};

use crate::api::validation::{
    is_valid_http_url, FieldErrors, MAX_LONG_TEXT_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN,
};
use crate::api::ApiJson;
use crate::config;
use crate::database::models::{DirectoryEntry, Profile};
use crate::database::repository::profiles::{self, ProfileChanges};
use crate::database::repository::users;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::storage::upload::read_image_field;
use crate::storage::{photo_key, store};

/// Profile plus the public URL of its photo
#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub photo_url: Option<String>,
}

impl ProfileView {
    pub fn new(profile: Profile) -> Result<Self, ApiError> {
        let photo_url = photo_url_for(profile.photo_key.as_deref())?;
        Ok(Self { profile, photo_url })
    }
}

/// Directory row with its photo resolved the same way as `ProfileView`
#[derive(Debug, Serialize)]
pub struct DirectoryCard {
    #[serde(flatten)]
    pub entry: DirectoryEntry,
    pub photo_url: Option<String>,
}

impl DirectoryCard {
    pub fn new(entry: DirectoryEntry) -> Result<Self, ApiError> {
        let photo_url = photo_url_for(entry.photo_key.as_deref())?;
        Ok(Self { entry, photo_url })
    }
}

fn photo_url_for(key: Option<&str>) -> Result<Option<String>, ApiError> {
    match key {
        Some(key) => Ok(Some(store().public_url(key)?)),
        None => Ok(None),
    }
}

/// Partial update. Absent keys are left alone; an empty string clears the value.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub phone: Option<String>,
}

impl ProfileUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.check("name", !name.trim().is_empty(), "Name cannot be empty");
            errors.max_len("name", Some(name.trim()), MAX_NAME_LEN);
        }
        errors.max_len("headline", self.headline.as_deref(), MAX_SHORT_TEXT_LEN);
        errors.max_len("bio", self.bio.as_deref(), MAX_LONG_TEXT_LEN);
        errors.max_len("company", self.company.as_deref(), MAX_SHORT_TEXT_LEN);
        errors.max_len("job_title", self.job_title.as_deref(), MAX_SHORT_TEXT_LEN);
        errors.max_len("location", self.location.as_deref(), MAX_SHORT_TEXT_LEN);
        errors.max_len("phone", self.phone.as_deref(), 40);
        if let Some(url) = self.linkedin_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            errors.check("linkedin_url", is_valid_http_url(url), "Must be an http(s) URL");
            errors.max_len("linkedin_url", Some(url), MAX_SHORT_TEXT_LEN);
        }
        errors.into_result()
    }

    fn into_changes(self) -> ProfileChanges {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
        ProfileChanges {
            headline: trim(self.headline),
            bio: trim(self.bio),
            company: trim(self.company),
            job_title: trim(self.job_title),
            location: trim(self.location),
            linkedin_url: trim(self.linkedin_url),
            phone: trim(self.phone),
        }
    }
}

/// GET /api/profile - Own profile
pub async fn profile_get(Extension(user): Extension<CurrentUser>) -> ApiResult<ProfileView> {
    let pool = DatabaseManager::pool().await?;
    let profile = profiles::find(&pool, user.id).await?;
    Ok(ApiResponse::success(ProfileView::new(profile)?))
}

/// PUT /api/profile - Update profile fields and the display name
///
/// ```json
/// { "name": "Ada King", "company": "Analytical Engines", "bio": "" }
/// ```
pub async fn profile_put(
    Extension(user): Extension<CurrentUser>,
    ApiJson(mut payload): ApiJson<ProfileUpdate>,
) -> ApiResult<ProfileView> {
    payload.validate()?;

    let pool = DatabaseManager::pool().await?;
    if let Some(name) = payload.name.take() {
        users::update_name(&pool, user.id, name.trim()).await?;
    }
    let profile = profiles::update(&pool, user.id, payload.into_changes()).await?;

    tracing::debug!("Profile updated for {}", user.id);
    Ok(ApiResponse::success(ProfileView::new(profile)?))
}

/// POST /api/profile/photo - Upload a jpg/png/webp photo
///
/// The object key is derived from the content, so re-uploading the same
/// image is a no-op for storage. The previous photo object is removed.
pub async fn photo_post(Extension(user): Extension<CurrentUser>, multipart: Multipart) -> ApiResult<ProfileView> {
    let limit = config::config().storage.max_photo_bytes;
    let upload = read_image_field(multipart, "photo", limit).await?;

    let key = photo_key(user.id, &upload.bytes, &upload.extension);
    let objects = store();
    objects.put(&key, &upload.bytes).await?;

    let pool = DatabaseManager::pool().await?;
    let previous = profiles::replace_photo_key(&pool, user.id, Some(&key)).await?;
    if let Some(previous) = previous.filter(|old| old != &key) {
        if let Err(e) = objects.delete(&previous).await {
            tracing::warn!("Failed to delete replaced photo {}: {}", previous, e);
        }
    }

    tracing::info!(
        "Stored photo {} for {} ({} bytes from {})",
        key,
        user.id,
        upload.bytes.len(),
        upload.original_name
    );

    let profile = profiles::find(&pool, user.id).await?;
    Ok(ApiResponse::success(ProfileView::new(profile)?))
}

/// DELETE /api/profile/photo - Remove the photo
pub async fn photo_delete(Extension(user): Extension<CurrentUser>) -> ApiResult<()> {
    let pool = DatabaseManager::pool().await?;
    if let Some(previous) = profiles::replace_photo_key(&pool, user.id, None).await? {
        store().delete(&previous).await?;
        tracing::info!("Removed photo {} for {}", previous, user.id);
    }
    Ok(ApiResponse::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_linkedin_url_clears_without_validation() {
        let update = ProfileUpdate {
            linkedin_url: Some("  ".into()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        assert_eq!(update.into_changes().linkedin_url.as_deref(), Some(""));
    }

    #[test]
    fn invalid_values_are_reported_per_field() {
        let update = ProfileUpdate {
            name: Some("   ".into()),
            linkedin_url: Some("ftp://example.org".into()),
            headline: Some("x".repeat(MAX_SHORT_TEXT_LEN + 1)),
            ..Default::default()
        };
        let body = update.validate().unwrap_err().to_json();
        assert_eq!(body["field_errors"]["name"], "Name cannot be empty");
        assert_eq!(body["field_errors"]["linkedin_url"], "Must be an http(s) URL");
        assert!(body["field_errors"]["headline"].is_string());
    }

    fn entry(photo_key: Option<&str>) -> DirectoryEntry {
        DirectoryEntry {
            id: uuid::Uuid::new_v4(),
            name: "Grace".into(),
            role: crate::types::Role::Alumni,
            field: Some("Physics".into()),
            batch_year: Some(2010),
            headline: None,
            company: Some("Acme".into()),
            job_title: None,
            location: None,
            photo_key: photo_key.map(str::to_string),
        }
    }

    #[test]
    fn directory_card_resolves_photo_url() {
        let card = DirectoryCard::new(entry(Some("photos/u1/abc.png"))).unwrap();
        let url = card.photo_url.as_deref().unwrap();
        assert!(url.ends_with("/photos/u1/abc.png"), "{url}");

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["photo_url"], url);
        assert_eq!(json["company"], "Acme");
    }

    #[test]
    fn directory_card_without_photo_has_null_url() {
        let json = serde_json::to_value(DirectoryCard::new(entry(None)).unwrap()).unwrap();
        assert!(json["photo_url"].is_null());
    }

    #[test]
    fn absent_keys_stay_absent() {
        let changes = ProfileUpdate {
            company: Some(" Acme ".into()),
            ..Default::default()
        }
        .into_changes();
        assert_eq!(changes.company.as_deref(), Some("Acme"));
        assert!(changes.bio.is_none());
    }
}
