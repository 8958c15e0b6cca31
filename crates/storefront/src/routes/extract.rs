//! Extractors whose rejections render as [`AppError`] JSON bodies.
//!
//! Drop-in replacements for `axum::Json`, `Path` and `Query`. `Json` also
//! works as a response.

use axum::extract::{FromRequest, FromRequestParts, OptionalFromRequest, Request};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body or response.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

/// Typed path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// Typed query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

// A request without a content type has no body
impl<T, S> OptionalFromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let body =
            <axum::Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?;
        Ok(body.map(|axum::Json(value)| Self(value)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{StatusCode, header};
    use serde::Deserialize;
    use serde_json::Value;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Note {
        note: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn error_body(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let err = <Json<Note> as FromRequest<()>>::from_request(
            request(Some("application/json"), "{not json"),
            &(),
        )
        .await
        .unwrap_err();

        let (status, body) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("JSON"));
    }

    #[tokio::test]
    async fn test_missing_field_keeps_axum_status() {
        let err = <Json<Note> as FromRequest<()>>::from_request(
            request(Some("application/json"), "{}"),
            &(),
        )
        .await
        .unwrap_err();

        let (status, body) = error_body(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("note"));
    }

    #[tokio::test]
    async fn test_optional_body() {
        let absent =
            <Json<Note> as OptionalFromRequest<()>>::from_request(request(None, ""), &())
                .await
                .unwrap();
        assert!(absent.is_none());

        let present = <Json<Note> as OptionalFromRequest<()>>::from_request(
            request(Some("application/json"), r#"{"note":"paid"}"#),
            &(),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(present.0.note, "paid");

        let wrong_type = <Json<Note> as OptionalFromRequest<()>>::from_request(
            request(Some("text/plain"), "paid"),
            &(),
        )
        .await
        .unwrap_err();
        assert_eq!(wrong_type.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
