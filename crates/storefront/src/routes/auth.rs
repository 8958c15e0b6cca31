//! Authentication route handlers.
//!
//! Registration and login both leave the user logged in; the session holds
//! a [`CurrentUser`] until logout or expiry.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use bundlehub_core::UserRole;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireUser, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::routes::extract::Json;
use crate::services::auth::{AuthError, Registration};
use crate::services::AuthService;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    /// `customer` when omitted
    pub role: Option<UserRole>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Create an account and log it in.
///
/// POST /api/auth/register
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(Registration {
            email: &body.email,
            password: &body.password,
            full_name: &body.full_name,
            phone: &body.phone,
            role: body.role.unwrap_or(UserRole::Customer),
        })
        .await?;

    start_session(&session, &user).await?;
    info!(user_id = %user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password.
///
/// POST /api/auth/login
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    start_session(&session, &user).await?;
    info!(user_id = %user.id, "User logged in");
    Ok(Json(user))
}

/// End the session.
///
/// POST /api/auth/logout
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in user, read fresh from the database.
///
/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, RequireUser(current): RequireUser) -> Result<Json<User>> {
    match AuthService::new(state.pool()).get_user(current.id).await {
        Ok(user) => Ok(Json(user)),
        // Account removed while the session was alive
        Err(AuthError::UserNotFound) => Err(AppError::Unauthorized("login required".to_string())),
        Err(e) => Err(e.into()),
    }
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}
