//! Authentication error types.

use thiserror::Error;

use bundlehub_core::UserRole;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bundlehub_core::EmailError),

    /// Invalid phone number.
    #[error("invalid phone: {0}")]
    InvalidPhone(#[from] bundlehub_core::PhoneError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Required profile field missing.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Role cannot be chosen at sign-up.
    #[error("cannot register as {0}")]
    RoleNotAllowed(UserRole),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
