//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bundlehub_core::{Email, PhoneNumber, UserId, UserRole};

/// A platform account (customer, agent or admin).
///
/// The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<PhoneNumber>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
