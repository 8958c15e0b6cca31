//! Fulfillment reconciliation.
//!
//! Orders stay `processing` when the vendor answered `pending`, or when the
//! vendor call or the local write failed half-way. This re-queries the vendor
//! for each one older than the threshold and settles it. Safe to run from
//! cron; every order is settled in its own transaction.
//!
//! # Usage
//!
//! ```bash
//! bh-cli reconcile --older-than-minutes 10
//! ```
//!
//! # Environment Variables
//!
//! - `BUNDLEHUB_DATABASE_URL` (or `DATABASE_URL`)
//! - `VENDOR_BASE_URL`, `VENDOR_API_KEY`, `VENDOR_TIMEOUT_SECS`, `VENDOR_MAX_ATTEMPTS`

use std::time::Duration;

use bundlehub_storefront::config::{ConfigError, VendorConfig};
use bundlehub_storefront::error::AppError;
use bundlehub_storefront::services::{FulfillmentService, ReconcileReport};
use bundlehub_storefront::vendor::{VendorClient, VendorError};

use super::{ConnectError, connect};

/// Errors that abort a reconciliation pass.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Vendor client error: {0}")]
    Vendor(#[from] VendorError),

    #[error(transparent)]
    App(#[from] AppError),
}

/// Settle up to `limit` orders processing for more than `older_than_minutes`.
///
/// # Errors
///
/// Returns `ReconcileError` if configuration is missing or the order listing
/// fails. Failures on single orders are counted in the report instead.
pub async fn run(older_than_minutes: u64, limit: i64) -> Result<ReconcileReport, ReconcileError> {
    let vendor = VendorClient::new(&VendorConfig::from_env()?)?;
    let pool = connect().await?;

    let older_than = Duration::from_secs(older_than_minutes.saturating_mul(60));
    Ok(FulfillmentService::new(&pool, &vendor)
        .reconcile(older_than, limit)
        .await?)
}
