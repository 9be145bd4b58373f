//! Extractors whose rejections use the API error envelope instead of axum's plain-text bodies.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!("Rejected JSON body: {}", rejection.body_text());
                Err(ApiError::bad_request(rejection.body_text()))
            }
        }
    }
}

/// JSON body that may be omitted. An empty body reads as `None`; anything
/// else must parse, so a malformed body is still a 400.
#[derive(Debug, Clone, Default)]
pub struct OptionalApiJson<T>(pub Option<T>);

#[async_trait]
impl<S, T> FromRequest<S> for OptionalApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }
        serde_json::from_slice(&bytes).map(|value| Self(Some(value))).map_err(|e| {
            tracing::debug!("Rejected optional JSON body: {}", e);
            ApiError::bad_request(format!("Failed to parse the request body as JSON: {}", e))
        })
    }
}

/// Query string parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Note {
        note: Option<String>,
    }

    fn post(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn empty_optional_body_is_none() {
        let OptionalApiJson(note) = OptionalApiJson::<Note>::from_request(post(""), &()).await.unwrap();
        assert!(note.is_none());
        let OptionalApiJson(note) = OptionalApiJson::<Note>::from_request(post("  \n"), &()).await.unwrap();
        assert!(note.is_none());
    }

    #[tokio::test]
    async fn present_optional_body_is_parsed() {
        let OptionalApiJson(note) = OptionalApiJson::<Note>::from_request(post(r#"{"note":"welcome"}"#), &())
            .await
            .unwrap();
        assert_eq!(note.and_then(|n| n.note).as_deref(), Some("welcome"));
    }

    #[tokio::test]
    async fn malformed_optional_body_is_rejected() {
        let err = OptionalApiJson::<Note>::from_request(post(r#"{"note":"#), &()).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "BAD_REQUEST");

        let err = OptionalApiJson::<Note>::from_request(post(r#"{"note": 5}"#), &()).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
