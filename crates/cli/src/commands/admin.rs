//! Admin account management.
//!
//! Admins cannot sign up through the API; this is the only way to create one.
//!
//! # Usage
//!
//! ```bash
//! bh-cli admin create -e admin@example.com -n "Admin Name" -p 'long password'
//! ```

use bundlehub_core::UserId;
use bundlehub_storefront::services::AuthService;
use bundlehub_storefront::services::auth::AuthError;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create an admin user with an argon2-hashed password.
///
/// # Errors
///
/// Returns `AdminError::Auth` for an invalid email, a short password or an
/// email that is already registered.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let pool = connect().await?;

    tracing::info!("Creating admin user: {}", email);
    let user = AuthService::new(&pool)
        .create_admin(email, name, password)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}
