// handlers/public/media.rs - GET /media/*key

use axum::{
    extract::Path,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::storage::{content_type_for, store, validate_key};

/// GET /media/*key - Serve a stored object with a content type derived from its extension.
/// Photo keys are content-addressed, so responses may be cached aggressively.
pub async fn object_get(Path(key): Path<String>) -> Result<Response, ApiError> {
    validate_key(&key)?;
    let bytes = store().get(&key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&key).to_string()),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        bytes,
    )
        .into_response())
}
