use std::path::Path;

use axum::extract::Multipart;
use thiserror::Error;

/// Accepted photo extensions (lowercase)
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read upload form: {0}")]
    Multipart(String),

    #[error("missing file field `{0}`")]
    MissingField(String),

    #[error("unsupported file type `{0}`")]
    UnsupportedType(String),

    #[error("file exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("file content does not match its `{0}` extension")]
    ContentMismatch(String),
}

/// A validated image read fully into memory
#[derive(Debug)]
pub struct ImageUpload {
    pub original_name: String,
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Read the file in `field_name` from a multipart form. Other fields are skipped.
/// The size limit is enforced while streaming so oversized uploads stop early.
pub async fn read_image_field(
    mut multipart: Multipart,
    field_name: &str,
    max_bytes: usize,
) -> Result<ImageUpload, UploadError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::Multipart(err.to_string()))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload.bin").to_string();
        let extension = extension_of(&original_name).unwrap_or_default();
        if !PHOTO_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadError::UnsupportedType(extension));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|err| UploadError::Multipart(err.to_string()))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge { limit: max_bytes });
            }
            bytes.extend_from_slice(&chunk);
        }

        if !matches_signature(&bytes, &extension) {
            return Err(UploadError::ContentMismatch(extension));
        }

        return Ok(ImageUpload {
            original_name: sanitize_filename::sanitize(&original_name),
            extension: normalized_extension(&extension).to_string(),
            bytes,
        });
    }

    Err(UploadError::MissingField(field_name.to_string()))
}

/// Lowercase extension of a client-supplied filename
pub fn extension_of(file_name: &str) -> Option<String> {
    let sanitized = sanitize_filename::sanitize(file_name);
    Path::new(&sanitized)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn normalized_extension(extension: &str) -> &str {
    match extension {
        "jpeg" => "jpg",
        other => other,
    }
}

/// Check the leading magic bytes against the claimed image type
pub fn matches_signature(bytes: &[u8], extension: &str) -> bool {
    match extension {
        "jpg" | "jpeg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "png" => bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
        "webp" => bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_lowercased() {
        assert_eq!(extension_of("Me.JPEG").as_deref(), Some("jpeg"));
        assert_eq!(extension_of(".hidden"), None);
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("noext"), None);
    }

    #[test]
    fn signatures() {
        assert!(matches_signature(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00], "jpg"));
        assert!(matches_signature(b"\x89PNG\r\n\x1a\nrest", "png"));
        assert!(matches_signature(b"RIFF\x10\x00\x00\x00WEBPVP8 ", "webp"));
        assert!(!matches_signature(b"GIF89a", "png"));
        assert!(!matches_signature(b"RIFF", "webp"));
    }

    #[test]
    fn jpeg_is_stored_as_jpg() {
        assert_eq!(normalized_extension("jpeg"), "jpg");
        assert_eq!(normalized_extension("png"), "png");
    }
}
