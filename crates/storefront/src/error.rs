//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. The response is always a JSON
//! object `{"error": "<message>"}`; server-side failures are captured to
//! Sentry and their details replaced with a generic message.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use bundlehub_core::{EmailError, PhoneError, PricingError, SlugError, TransitionError, WalletError};

use crate::db::RepositoryError;
use crate::paystack::PaymentError;
use crate::services::auth::AuthError;
use crate::services::logo::LogoError;
use crate::vendor::VendorError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Vendor API operation failed.
    #[error("Vendor error: {0}")]
    Vendor(#[from] VendorError),

    /// Payment gateway operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Store wallet operation refused.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Order state change refused.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Price or cost invalid.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Customer wallet cannot cover a purchase.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks the role or ownership.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Duplicate or out-of-order request.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Request body, path or query could not be extracted.
    #[error("Rejected request: {1}")]
    Rejected(StatusCode, String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("resource".to_string()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Database(other),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(RepositoryError::Database(err))
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        Self::BadRequest(format!("invalid email: {err}"))
    }
}

impl From<PhoneError> for AppError {
    fn from(err: PhoneError) -> Self {
        Self::BadRequest(format!("invalid phone: {err}"))
    }
}

impl From<SlugError> for AppError {
    fn from(err: SlugError) -> Self {
        Self::BadRequest(format!("invalid slug: {err}"))
    }
}

impl From<LogoError> for AppError {
    fn from(err: LogoError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {err}"))
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Vendor(_) => StatusCode::BAD_GATEWAY,
            Self::Payment(err) => match err {
                PaymentError::InvalidSignature => StatusCode::UNAUTHORIZED,
                PaymentError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidPhone(_)
                | AuthError::MissingField(_) => StatusCode::BAD_REQUEST,
                AuthError::RoleNotAllowed(_) => StatusCode::FORBIDDEN,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Wallet(err) => match err {
                WalletError::InsufficientAvailable { .. } | WalletError::InsufficientPending { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                WalletError::NonPositiveAmount | WalletError::TooPrecise => StatusCode::BAD_REQUEST,
            },
            Self::InsufficientFunds(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Transition(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Pricing(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Rejected(status, _) => *status,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Vendor(_) => "Bundle provider unavailable".to_string(),
            Self::Payment(PaymentError::InvalidSignature) => "Invalid signature".to_string(),
            Self::Payment(PaymentError::InvalidAmount(_)) => "Invalid amount".to_string(),
            Self::Payment(_) => "Payment provider unavailable".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::InvalidPhone(_) => "Invalid phone number".to_string(),
                AuthError::MissingField(_) | AuthError::RoleNotAllowed(_) => err.to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
            },
            Self::Wallet(err) => err.to_string(),
            Self::Transition(err) => err.to_string(),
            Self::Pricing(err) => err.to_string(),
            Self::RateLimited => "Too many requests".to_string(),
            Self::InsufficientFunds(msg)
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::Rejected(_, msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(ErrorBody {
            error: self.public_message(),
        });
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use rust_decimal::Decimal;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product".to_string());
        assert_eq!(err.to_string(), "Not found: product");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(VendorError::Parse("x".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(PaymentError::InvalidSignature).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_domain_errors() {
        let insufficient = WalletError::InsufficientAvailable {
            requested: Decimal::TEN,
            available: Decimal::ONE,
        };
        assert_eq!(
            AppError::from(insufficient).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(WalletError::TooPrecise).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(TransitionError::Unpaid(bundlehub_core::OrderStatus::Completed))
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(PricingError::NonPositivePrice).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_repository_error_mapping() {
        assert!(matches!(
            AppError::from(RepositoryError::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::Conflict("slug already taken".into())),
            AppError::Conflict(m) if m == "slug already taken"
        ));
        assert!(matches!(
            AppError::from(RepositoryError::DataCorruption("bad".into())),
            AppError::Database(_)
        ));
    }

    #[tokio::test]
    async fn test_json_body() {
        let (status, body) = body_of(AppError::BadRequest("amount is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "amount is required"}));
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (status, body) = body_of(AppError::Internal("connection refused at 10.0.0.3".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");

        let (status, body) = body_of(AppError::Vendor(VendorError::Api {
            status: 500,
            message: "stack trace".into(),
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Bundle provider unavailable");
    }
}
