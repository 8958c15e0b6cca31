//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::paystack::PaystackClient;
use crate::vendor::{VendorClient, VendorError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    vendor: VendorClient,
    paystack: PaystackClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor HTTP client cannot be built.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, VendorError> {
        let vendor = VendorClient::new(&config.vendor)?;
        let paystack = PaystackClient::new(&config.paystack);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                vendor,
                paystack,
            }),
        })
    }

    /// Server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Wholesale bundle vendor.
    #[must_use]
    pub fn vendor(&self) -> &VendorClient {
        &self.inner.vendor
    }

    /// Payment gateway.
    #[must_use]
    pub fn paystack(&self) -> &PaystackClient {
        &self.inner.paystack
    }
}
