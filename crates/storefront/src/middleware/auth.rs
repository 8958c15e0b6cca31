//! Authentication extractors.
//!
//! The session stores the [`CurrentUser`] written at login. Extractors read
//! it back and reject with the usual JSON error body: 401 without a login,
//! 403 for the wrong role.
//!
//! ```rust,ignore
//! async fn handler(RequireAgent(agent): RequireAgent) -> Result<Json<Store>> {
//!     StoreService::new(state.pool()).for_owner(agent.id).await.map(Json)
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use bundlehub_core::UserRole;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Any logged-in user.
pub struct RequireUser(pub CurrentUser);

/// A logged-in agent.
pub struct RequireAgent(pub CurrentUser);

/// A logged-in admin.
pub struct RequireAdmin(pub CurrentUser);

/// The logged-in user, if any.
pub struct OptionalUser(pub Option<CurrentUser>);

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

async fn require_role(parts: &Parts, role: UserRole) -> Result<CurrentUser, AppError> {
    let user = current_user(parts)
        .await
        .ok_or_else(|| AppError::Unauthorized("login required".to_string()))?;
    if user.role != role {
        return Err(AppError::Forbidden(format!("{role} access required")));
    }
    Ok(user)
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("login required".to_string()))
    }
}

impl<S> FromRequestParts<S> for RequireAgent
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, UserRole::Agent).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, UserRole::Admin).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Store the logged-in user in the session.
///
/// The session ID is cycled first to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// End the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
