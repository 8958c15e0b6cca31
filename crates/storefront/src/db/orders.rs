//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use bundlehub_core::{
    Network, OrderId, OrderState, OrderStatus, PaymentMethod, PhoneNumber, ProductId, StoreId,
    UserId,
};

use super::RepositoryError;
use crate::models::Order;

const ORDER_COLUMNS: &str = "id, store_id, product_id, customer_id, customer_email, \
     recipient_phone, network, package_code, amount, cost, profit, reference, payment_method, \
     payment_status, order_status, vendor_reference, failure_reason, created_at, updated_at";

/// Fields for a new order. Amount, cost and profit are copied from the
/// product at purchase time.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub customer_id: Option<UserId>,
    pub customer_email: Option<&'a str>,
    pub recipient_phone: &'a PhoneNumber,
    pub network: Network,
    pub package_code: &'a str,
    pub amount: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub reference: &'a str,
    pub payment_method: PaymentMethod,
    pub state: OrderState,
}

/// Columns written together with a state change.
#[derive(Debug, Default)]
pub struct OrderUpdate<'a> {
    pub vendor_reference: Option<&'a str>,
    pub failure_reason: Option<&'a str>,
}

/// Per-store order figures.
#[derive(Debug, Clone, Default, serde::Serialize, sqlx::FromRow)]
pub struct OrderTotals {
    pub total: i64,
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
    pub cancelled: i64,
    /// Sum of completed order amounts
    pub revenue: Decimal,
    /// Sum of completed order profits
    pub profit: Decimal,
}

/// Insert an order.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the reference is already used.
pub async fn insert(conn: &mut PgConnection, new: NewOrder<'_>) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        r"
        INSERT INTO bundlehub.store_order
            (id, store_id, product_id, customer_id, customer_email, recipient_phone, network,
             package_code, amount, cost, profit, reference, payment_method, payment_status,
             order_status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(OrderId::new())
    .bind(new.store_id)
    .bind(new.product_id)
    .bind(new.customer_id)
    .bind(new.customer_email)
    .bind(new.recipient_phone)
    .bind(new.network)
    .bind(new.package_code)
    .bind(new.amount)
    .bind(new.cost)
    .bind(new.profit)
    .bind(new.reference)
    .bind(new.payment_method)
    .bind(new.state.payment)
    .bind(new.state.order)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| RepositoryError::unique(e, "order reference already exists"))
}

/// Lock an order by ID for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
pub async fn lock(conn: &mut PgConnection, id: OrderId) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM bundlehub.store_order WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Persist a new state for a locked order.
///
/// `vendor_reference` and `failure_reason` are only overwritten when given.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn update_state(
    conn: &mut PgConnection,
    id: OrderId,
    state: OrderState,
    update: OrderUpdate<'_>,
) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        r"
        UPDATE bundlehub.store_order
        SET payment_status = $2, order_status = $3,
            vendor_reference = COALESCE($4, vendor_reference),
            failure_reason = COALESCE($5, failure_reason),
            updated_at = now()
        WHERE id = $1
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(id)
    .bind(state.payment)
    .bind(state.order)
    .bind(update.vendor_reference)
    .bind(update.failure_reason)
    .fetch_one(&mut *conn)
    .await
    .map_err(RepositoryError::from)
}

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by its public reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_reference(&self, reference: &str) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM bundlehub.store_order WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Orders of a store, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(
        &self,
        store_id: StoreId,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM bundlehub.store_order
            WHERE store_id = $1 AND ($2::bundlehub.order_status IS NULL OR order_status = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "
        ))
        .bind(store_id)
        .bind(status)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Orders that have sat in `processing` since before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_stuck_processing(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM bundlehub.store_order
            WHERE order_status = 'processing' AND updated_at < $1
            ORDER BY updated_at
            LIMIT $2
            "
        ))
        .bind(cutoff)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Order counts and completed totals, for one store or the whole platform.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(&self, store_id: Option<StoreId>) -> Result<OrderTotals, RepositoryError> {
        let totals = sqlx::query_as::<_, OrderTotals>(
            r"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE order_status = 'pending') AS pending,
                   COUNT(*) FILTER (WHERE order_status = 'processing') AS processing,
                   COUNT(*) FILTER (WHERE order_status = 'completed') AS completed,
                   COUNT(*) FILTER (WHERE order_status = 'failed') AS failed,
                   COUNT(*) FILTER (WHERE order_status = 'cancelled') AS cancelled,
                   COALESCE(SUM(amount) FILTER (WHERE order_status = 'completed'), 0) AS revenue,
                   COALESCE(SUM(profit) FILTER (WHERE order_status = 'completed'), 0) AS profit
            FROM bundlehub.store_order
            WHERE $1::uuid IS NULL OR store_id = $1
            ",
        )
        .bind(store_id)
        .fetch_one(self.pool)
        .await?;

        Ok(totals)
    }
}
