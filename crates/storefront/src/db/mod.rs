//! Database operations for the Bundlehub `PostgreSQL` schema.
//!
//! # Schema: `bundlehub`
//!
//! ## Tables
//!
//! - `app_user` - Accounts (customers, agents, admins)
//! - `store` - Agent stores, wallet balances as columns
//! - `store_ledger` - Every store wallet mutation
//! - `product` - Bundles a store sells
//! - `store_order` - Bundle purchases
//! - `withdrawal` - Store cash-out requests
//! - `customer_wallet` / `wallet_transaction` - Customer balances
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Transactions
//!
//! Read-only lookups go through the `*Repository` structs, which borrow the
//! pool. Anything that moves money takes a `&mut PgConnection` so callers can
//! run it inside one transaction with the matching status change.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bundlehub-cli -- migrate
//! ```

pub mod ledger;
pub mod orders;
pub mod products;
pub mod stores;
pub mod users;
pub mod wallets;
pub mod withdrawals;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use ledger::LedgerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use stores::StoreRepository;
pub use users::UserRepository;
pub use wallets::WalletRepository;
pub use withdrawals::WithdrawalRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to [`RepositoryError::Conflict`] with `message`.
    pub(crate) fn unique(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
