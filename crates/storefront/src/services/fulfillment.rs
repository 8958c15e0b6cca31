//! Order fulfillment through the vendor.
//!
//! An order reaches `processing` only once it is paid. From there
//! [`FulfillmentService::dispatch`] buys the bundle and settles the order:
//!
//! | Vendor answer | Order | Money |
//! |---------------|-------|-------|
//! | `success` | completed | profit credited to the store |
//! | `pending` | stays processing | none yet |
//! | `failed` / 4xx | failed | customer refunded |
//! | unreachable / unreadable | stays processing | none yet |
//!
//! Orders left in `processing` are settled later by
//! [`FulfillmentService::reconcile`], which asks the vendor for the status of
//! the same reference.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};

use bundlehub_core::{LedgerKind, OrderId, OrderState, OrderStatus, WalletTxKind};

use crate::db::OrderRepository;
use crate::db::orders::{self, OrderUpdate};
use crate::db::wallets::{self, NewWalletTransaction};
use crate::error::{AppError, Result};
use crate::models::Order;
use crate::services::references::refund_reference;
use crate::services::store_wallet::{self, Movement};
use crate::vendor::{PurchaseRequest, VendorClient, VendorError, VendorOrder, VendorOrderStatus};

/// Counts from one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub checked: usize,
    pub completed: usize,
    pub failed: usize,
    pub still_processing: usize,
    pub redispatched: usize,
    pub errors: usize,
}

impl ReconcileReport {
    fn record(&mut self, order: &Order) {
        match order.order_status {
            OrderStatus::Completed => self.completed += 1,
            OrderStatus::Failed | OrderStatus::Cancelled => self.failed += 1,
            OrderStatus::Pending | OrderStatus::Processing => self.still_processing += 1,
        }
    }
}

/// Buys bundles from the vendor and settles orders.
pub struct FulfillmentService<'a> {
    pool: &'a PgPool,
    vendor: &'a VendorClient,
}

impl<'a> FulfillmentService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, vendor: &'a VendorClient) -> Self {
        Self { pool, vendor }
    }

    /// Purchase the bundle for a `processing` order and apply the outcome.
    ///
    /// Vendor outages are not errors here: the order stays `processing` and
    /// the returned order says so.
    ///
    /// # Errors
    ///
    /// Returns an error only if the outcome cannot be written.
    #[instrument(skip(self, order), fields(reference = %order.reference))]
    pub async fn dispatch(&self, order: &Order) -> Result<Order> {
        if order.order_status != OrderStatus::Processing {
            return Ok(order.clone());
        }

        let request = PurchaseRequest {
            reference: &order.reference,
            package_code: &order.package_code,
            network: order.network,
            recipient_phone: order.recipient_phone.as_str(),
        };

        match self.vendor.purchase(&request).await {
            Ok(answer) => self.settle(order.id, &answer).await,
            // An unreadable answer may still mean the vendor accepted it
            Err(e) if e.is_transient() || matches!(e, VendorError::Parse(_)) => {
                warn!(error = %e, "Vendor outcome unknown, order left processing");
                Ok(order.clone())
            }
            Err(e) => {
                warn!(error = %e, "Vendor rejected order");
                let reason = rejection_reason(&e);
                self.settle(
                    order.id,
                    &VendorOrder {
                        status: VendorOrderStatus::Failed,
                        vendor_reference: None,
                        message: Some(reason),
                    },
                )
                .await
            }
        }
    }

    /// Re-check orders stuck in `processing` for longer than `older_than`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stuck orders cannot be listed; failures on
    /// individual orders are counted in the report instead.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, older_than: Duration, limit: i64) -> Result<ReconcileReport> {
        let age = chrono::Duration::from_std(older_than)
            .map_err(|e| AppError::BadRequest(format!("invalid age: {e}")))?;
        let cutoff = Utc::now() - age;
        let stuck = OrderRepository::new(self.pool)
            .list_stuck_processing(cutoff, limit)
            .await?;

        let mut report = ReconcileReport::default();
        for order in stuck {
            report.checked += 1;
            let settled = match self.vendor.order_status(&order.reference).await {
                Ok(answer) => self.settle(order.id, &answer).await,
                Err(VendorError::NotFound(_)) => {
                    // The purchase never reached the vendor
                    report.redispatched += 1;
                    self.dispatch(&order).await
                }
                Err(e) => Err(e.into()),
            };

            match settled {
                Ok(order) => report.record(&order),
                Err(e) => {
                    report.errors += 1;
                    warn!(reference = %order.reference, error = %e, "Reconcile failed for order");
                }
            }
        }

        info!(
            checked = report.checked,
            completed = report.completed,
            failed = report.failed,
            still_processing = report.still_processing,
            redispatched = report.redispatched,
            errors = report.errors,
            "Reconciliation finished"
        );
        Ok(report)
    }

    /// Apply a vendor answer to a locked order.
    async fn settle(&self, order_id: OrderId, answer: &VendorOrder) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let order = orders::lock(&mut tx, order_id).await?;

        // Another worker settled it first
        if order.order_status != OrderStatus::Processing {
            tx.commit().await?;
            return Ok(order);
        }

        let vendor_reference = answer.vendor_reference.as_deref();
        let updated = match answer.status {
            VendorOrderStatus::Success => complete(&mut tx, &order, vendor_reference).await?,
            VendorOrderStatus::Pending => {
                orders::update_state(
                    &mut tx,
                    order.id,
                    order.state(),
                    OrderUpdate {
                        vendor_reference,
                        failure_reason: None,
                    },
                )
                .await?
            }
            VendorOrderStatus::Failed => {
                let reason = answer.message.as_deref().unwrap_or("vendor could not deliver");
                stop(&mut tx, &order, OrderStatus::Failed, Some(reason)).await?
            }
        };

        tx.commit().await?;
        info!(
            reference = %updated.reference,
            order_status = %updated.order_status,
            payment_status = %updated.payment_status,
            "Order settled"
        );
        Ok(updated)
    }
}

/// Complete a locked order and credit the store its profit.
///
/// The `processing -> completed` transition can only succeed once, which
/// keeps the credit to one per order.
pub(crate) async fn complete(
    conn: &mut PgConnection,
    order: &Order,
    vendor_reference: Option<&str>,
) -> Result<Order> {
    let state = order.state().transition(OrderStatus::Completed)?;
    let updated = orders::update_state(
        &mut *conn,
        order.id,
        state,
        OrderUpdate {
            vendor_reference,
            failure_reason: None,
        },
    )
    .await?;

    store_wallet::apply(
        &mut *conn,
        order.store_id,
        Movement {
            kind: LedgerKind::SaleProfit,
            amount: order.profit,
            reference: Some(&order.reference),
            note: None,
            created_by: None,
        },
    )
    .await?;

    Ok(updated)
}

/// Fail or cancel a locked order, refunding the customer if money is held.
pub(crate) async fn stop(
    conn: &mut PgConnection,
    order: &Order,
    next: OrderStatus,
    reason: Option<&str>,
) -> Result<Order> {
    let state = order.state().transition(next)?;
    let state = refund_held(&mut *conn, order, state).await?;

    orders::update_state(
        &mut *conn,
        order.id,
        state,
        OrderUpdate {
            vendor_reference: None,
            failure_reason: reason,
        },
    )
    .await
    .map_err(AppError::from)
}

/// Return held money for a stopped order and give back the resulting state.
///
/// Refunds go to the customer wallet. Guest payments have no wallet to
/// refund into and stay `paid` for a manual refund.
pub(crate) async fn refund_held(
    conn: &mut PgConnection,
    order: &Order,
    state: OrderState,
) -> Result<OrderState> {
    if !state.needs_refund() {
        return Ok(state);
    }

    let Some(customer_id) = order.customer_id else {
        warn!(
            reference = %order.reference,
            amount = %order.amount,
            customer_email = ?order.customer_email,
            "Guest payment needs a manual refund"
        );
        return Ok(state);
    };

    let wallet = wallets::lock_for_user(&mut *conn, customer_id).await?;
    let reference = refund_reference(&order.reference);
    wallets::apply(
        &mut *conn,
        &wallet,
        NewWalletTransaction {
            kind: WalletTxKind::Refund,
            amount: order.amount,
            reference: &reference,
            description: Some("Refund for undelivered bundle"),
        },
    )
    .await?;
    info!(reference = %order.reference, amount = %order.amount, "Order refunded to wallet");
    state.refund().map_err(AppError::from)
}

fn rejection_reason(error: &VendorError) -> String {
    match error {
        VendorError::Api { message, .. } if !message.is_empty() => {
            format!("vendor rejected order: {message}")
        }
        _ => "vendor rejected order".to_string(),
    }
}
