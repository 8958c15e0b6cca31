//! Products a store resells from the vendor catalog.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use bundlehub_core::{Pricing, ProductId, UserId};

use crate::db::ProductRepository;
use crate::db::products::{DeleteOutcome, NewProduct};
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::services::orders::owned_store;
use crate::vendor::{Package, VendorClient, VendorError};

/// New product form. The cost always comes from the vendor.
#[derive(Debug)]
pub struct ProductForm<'a> {
    pub package_code: &'a str,
    pub price: Decimal,
    /// Defaults to the vendor's package name
    pub name: Option<&'a str>,
    pub is_active: bool,
}

/// Product edit form; missing fields stay unchanged.
#[derive(Debug, Default)]
pub struct ProductEdit<'a> {
    pub name: Option<&'a str>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

pub struct ProductService<'a> {
    pool: &'a PgPool,
    vendor: &'a VendorClient,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, vendor: &'a VendorClient) -> Self {
        Self { pool, vendor }
    }

    /// The vendor's wholesale catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Vendor` if the catalog cannot be fetched.
    pub async fn catalog(&self) -> Result<Vec<Package>> {
        Ok(self.vendor.packages().await?)
    }

    /// All products of the agent's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the agent has no store.
    pub async fn list(&self, owner: UserId) -> Result<Vec<Product>> {
        let store = owned_store(self.pool, owner).await?;
        Ok(ProductRepository::new(self.pool)
            .list_for_store(store.id)
            .await?)
    }

    /// Add a vendor package to the agent's approved store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for an unapproved store,
    /// `AppError::BadRequest` for an unknown package and `AppError::Pricing`
    /// if the price is below the wholesale cost.
    #[instrument(skip(self, form), fields(package_code = %form.package_code, price = %form.price))]
    pub async fn create(&self, owner: UserId, form: ProductForm<'_>) -> Result<Product> {
        let store = owned_store(self.pool, owner).await?;
        if !store.status.is_open() {
            return Err(AppError::Forbidden(
                "store must be approved before adding products".to_string(),
            ));
        }

        let package = match self.vendor.package(form.package_code.trim()).await {
            Ok(package) => package,
            Err(VendorError::NotFound(_)) => {
                return Err(AppError::BadRequest(format!(
                    "unknown package: {}",
                    form.package_code
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let pricing = Pricing::new(form.price, package.price)?;
        let name = form
            .name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&package.name);

        let product = ProductRepository::new(self.pool)
            .create(NewProduct {
                store_id: store.id,
                network: package.network,
                name,
                package_code: &package.code,
                data_volume_mb: package.data_volume_mb,
                pricing,
                is_active: form.is_active,
            })
            .await?;

        info!(product_id = %product.id, profit = %pricing.profit, "Product created");
        Ok(product)
    }

    /// Edit a product; a new price recomputes profit and margin.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product is not in the agent's
    /// store and `AppError::Pricing` for an invalid price.
    pub async fn update(&self, owner: UserId, id: ProductId, edit: ProductEdit<'_>) -> Result<Product> {
        let product = self.owned_product(owner, id).await?;

        let pricing = product.pricing()?;
        let pricing = match edit.price {
            Some(price) => pricing.with_price(price)?,
            None => pricing,
        };
        let name = edit
            .name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&product.name);
        let is_active = edit.is_active.unwrap_or(product.is_active);

        Ok(ProductRepository::new(self.pool)
            .update(product.id, name, pricing, is_active)
            .await?)
    }

    /// Delete a product, or deactivate it if it has orders.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product is not in the agent's store.
    pub async fn delete(&self, owner: UserId, id: ProductId) -> Result<DeleteOutcome> {
        let product = self.owned_product(owner, id).await?;
        let outcome = ProductRepository::new(self.pool).delete(product.id).await?;
        info!(product_id = %id, ?outcome, "Product removed");
        Ok(outcome)
    }

    async fn owned_product(&self, owner: UserId, id: ProductId) -> Result<Product> {
        let store = owned_store(self.pool, owner).await?;
        ProductRepository::new(self.pool)
            .get_for_store(store.id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("product".to_string()))
    }
}
