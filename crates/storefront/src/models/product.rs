//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bundlehub_core::{Network, Pricing, ProductId, StoreId};

/// A data bundle a store sells.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub network: Network,
    pub name: String,
    /// Vendor package code this product resells
    pub package_code: String,
    pub data_volume_mb: i32,
    pub cost: Decimal,
    pub price: Decimal,
    pub profit: Decimal,
    pub profit_margin: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The stored price and cost with freshly derived profit figures.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored values no longer form valid pricing.
    pub fn pricing(&self) -> Result<Pricing, bundlehub_core::PricingError> {
        Pricing::new(self.price, self.cost)
    }
}

/// What customers see of a product. Cost and profit stay with the agent.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProduct {
    pub id: ProductId,
    pub network: Network,
    pub name: String,
    pub data_volume_mb: i32,
    pub price: Decimal,
}

impl From<Product> for PublicProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            network: product.network,
            name: product.name,
            data_volume_mb: product.data_volume_mb,
            price: product.price,
        }
    }
}
