//! Object storage for uploaded photos.
//!
//! Handlers only see the [`ObjectStore`] trait; the process-wide backend is a
//! [`LocalObjectStore`] rooted at `STORAGE_ROOT` and served under `/media/`.

pub mod local;
pub mod upload;

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

pub use local::LocalObjectStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid public base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Deleting a missing object succeeds
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn public_url(&self, key: &str) -> Result<String, StorageError>;
}

static STORE: Lazy<Arc<dyn ObjectStore>> = Lazy::new(|| {
    let storage = &config::config().storage;
    Arc::new(LocalObjectStore::new(&storage.root, &storage.public_base_url))
});

/// Process-wide object store
pub fn store() -> Arc<dyn ObjectStore> {
    STORE.clone()
}

/// Keys are relative, slash-separated paths without empty, `.` or `..` segments
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key.len() <= 512
        && !key.starts_with('/')
        && !key.contains('\\')
        && !key.contains('\0')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// `photos/<user>/<first 16 hex chars of sha256>.<ext>`
pub fn photo_key(user_id: Uuid, bytes: &[u8], extension: &str) -> String {
    let digest = Sha256::digest(bytes);
    let hash = format!("{:x}", digest);
    format!("photos/{}/{}.{}", user_id, &hash[..16], extension)
}

/// Content type for a stored key, from its extension
pub fn content_type_for(key: &str) -> mime::Mime {
    let extension = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "png" => mime::IMAGE_PNG,
        "webp" => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation() {
        assert!(validate_key("photos/abc/def.png").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("photos/../secret").is_err());
        assert!(validate_key("photos//x.png").is_err());
        assert!(validate_key("photos\\x.png").is_err());
        assert!(validate_key("./x.png").is_err());
    }

    #[test]
    fn photo_keys_are_content_addressed() {
        let user = Uuid::nil();
        let a = photo_key(user, b"one", "png");
        let b = photo_key(user, b"one", "png");
        let c = photo_key(user, b"two", "png");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("photos/00000000-0000-0000-0000-000000000000/"));
        assert!(a.ends_with(".png"));
        assert!(validate_key(&a).is_ok());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a/b.JPG"), mime::IMAGE_JPEG);
        assert_eq!(content_type_for("a/b.png"), mime::IMAGE_PNG);
        assert_eq!(content_type_for("a/b.webp").essence_str(), "image/webp");
        assert_eq!(content_type_for("a/b"), mime::APPLICATION_OCTET_STREAM);
    }
}
