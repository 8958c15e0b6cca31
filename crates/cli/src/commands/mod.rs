//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod reconcile;

use bundlehub_storefront::config::{self, ConfigError};
use bundlehub_storefront::db;
use sqlx::PgPool;

/// Connect to the database named by `BUNDLEHUB_DATABASE_URL`.
async fn connect() -> Result<PgPool, ConnectError> {
    let database_url = config::database_url_from_env()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}

/// Errors from opening the connection pool.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}
