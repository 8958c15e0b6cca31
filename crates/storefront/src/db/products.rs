//! Product repository.

use sqlx::PgPool;

use bundlehub_core::{Network, Pricing, ProductId, StoreId};

use super::RepositoryError;
use crate::models::Product;

const PRODUCT_COLUMNS: &str = "id, store_id, network, name, package_code, data_volume_mb, \
     cost, price, profit, profit_margin, is_active, created_at, updated_at";

/// Fields for a new product. Cost comes from the vendor catalog.
#[derive(Debug)]
pub struct NewProduct<'a> {
    pub store_id: StoreId,
    pub network: Network,
    pub name: &'a str,
    pub package_code: &'a str,
    pub data_volume_mb: i32,
    pub pricing: Pricing,
    pub is_active: bool,
}

/// Result of deleting a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    /// Orders reference the product, so it was hidden instead.
    Deactivated,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products of a store, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(&self, store_id: StoreId) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM bundlehub.product
            WHERE store_id = $1
            ORDER BY network, data_volume_mb
            "
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Products customers can buy.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self, store_id: StoreId) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM bundlehub.product
            WHERE store_id = $1 AND is_active
            ORDER BY network, data_volume_mb
            "
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product that belongs to `store_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_store(
        &self,
        store_id: StoreId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM bundlehub.product WHERE id = $1 AND store_id = $2"
        ))
        .bind(id)
        .bind(store_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the store already sells this package.
    pub async fn create(&self, new: NewProduct<'_>) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO bundlehub.product
                (id, store_id, network, name, package_code, data_volume_mb, cost, price,
                 profit, profit_margin, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(ProductId::new())
        .bind(new.store_id)
        .bind(new.network)
        .bind(new.name)
        .bind(new.package_code)
        .bind(new.data_volume_mb)
        .bind(new.pricing.cost)
        .bind(new.pricing.price)
        .bind(new.pricing.profit)
        .bind(new.pricing.profit_margin)
        .bind(new.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "store already sells this package"))
    }

    /// Store new pricing, name and visibility for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        name: &str,
        pricing: Pricing,
        is_active: bool,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE bundlehub.product
            SET name = $2, price = $3, cost = $4, profit = $5, profit_margin = $6,
                is_active = $7, updated_at = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(name)
        .bind(pricing.price)
        .bind(pricing.cost)
        .bind(pricing.profit)
        .bind(pricing.profit_margin)
        .bind(is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product, or deactivate it if orders reference it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<DeleteOutcome, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM bundlehub.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await;

        match deleted {
            Ok(result) if result.rows_affected() == 0 => Err(RepositoryError::NotFound),
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                sqlx::query(
                    "UPDATE bundlehub.product SET is_active = FALSE, updated_at = now() WHERE id = $1",
                )
                .bind(id)
                .execute(self.pool)
                .await?;
                Ok(DeleteOutcome::Deactivated)
            }
            Err(e) => Err(e.into()),
        }
    }
}
