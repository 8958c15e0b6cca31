//! Store orders: checkout, payment confirmation and the agent's manual path.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use bundlehub_core::{
    Email, OrderId, OrderState, OrderStatus, PaymentMethod, PaymentStatus, PhoneNumber, ProductId,
    Slug, UserId, WalletTxKind,
};

use crate::db::orders::{self, NewOrder, OrderUpdate};
use crate::db::wallets::{self, NewWalletTransaction};
use crate::db::{OrderRepository, ProductRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::models::{CurrentUser, Order, OrderTracking, Store};
use crate::paystack::PaystackClient;
use crate::services::fulfillment::{self, FulfillmentService};
use crate::services::references::order_reference;
use crate::vendor::VendorClient;

/// Most orders returned by a listing.
const LIST_LIMIT: i64 = 200;

/// Checkout form.
#[derive(Debug)]
pub struct Checkout<'a> {
    pub product_id: ProductId,
    pub recipient_phone: &'a str,
    pub payment_method: PaymentMethod,
    /// Required for guest gateway payments
    pub email: Option<&'a str>,
}

/// Checkout result.
#[derive(Debug, Serialize)]
pub struct PlacedOrder {
    pub order: OrderTracking,
    /// Gateway checkout page for `paystack` orders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
}

/// What to pass to the gateway for an order.
#[derive(Debug, Serialize)]
struct OrderMetadata<'a> {
    kind: &'static str,
    store_id: String,
    reference: &'a str,
}

pub struct OrderService<'a> {
    pool: &'a PgPool,
    vendor: &'a VendorClient,
    paystack: &'a PaystackClient,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, vendor: &'a VendorClient, paystack: &'a PaystackClient) -> Self {
        Self {
            pool,
            vendor,
            paystack,
        }
    }

    const fn fulfillment(&self) -> FulfillmentService<'a> {
        FulfillmentService::new(self.pool, self.vendor)
    }

    /// Place an order in an approved store.
    ///
    /// Wallet orders are paid and fulfilled immediately. Gateway orders are
    /// created `pending` and return the checkout URL.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for a closed store or inactive product,
    /// `AppError::Unauthorized` for a wallet order without a login and
    /// `AppError::InsufficientFunds` if the wallet cannot cover it.
    #[instrument(skip(self, checkout, customer), fields(slug = %slug))]
    pub async fn place(
        &self,
        slug: &Slug,
        checkout: Checkout<'_>,
        customer: Option<&CurrentUser>,
    ) -> Result<PlacedOrder> {
        let store = open_store(self.pool, slug).await?;
        let product = ProductRepository::new(self.pool)
            .get_for_store(store.id, checkout.product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound("product".to_string()))?;
        let recipient = PhoneNumber::parse(checkout.recipient_phone)?;

        let reference = order_reference();
        let draft = NewOrder {
            store_id: store.id,
            product_id: product.id,
            customer_id: customer.map(|c| c.id),
            customer_email: None,
            recipient_phone: &recipient,
            network: product.network,
            package_code: &product.package_code,
            amount: product.price,
            cost: product.cost,
            profit: product.profit,
            reference: &reference,
            payment_method: checkout.payment_method,
            state: OrderState::default(),
        };

        match checkout.payment_method {
            PaymentMethod::Wallet => {
                let customer = customer.ok_or_else(|| {
                    AppError::Unauthorized("log in to pay from your wallet".to_string())
                })?;

                let mut tx = self.pool.begin().await?;
                let wallet = wallets::lock_for_user(&mut tx, customer.id).await?;
                if wallet.balance < product.price {
                    return Err(AppError::InsufficientFunds(format!(
                        "wallet balance {} is below the price {}",
                        wallet.balance, product.price
                    )));
                }

                let state = OrderState::default()
                    .mark_paid()?
                    .transition(OrderStatus::Processing)?;
                let order = orders::insert(
                    &mut tx,
                    NewOrder {
                        customer_email: Some(customer.email.as_str()),
                        state,
                        ..draft
                    },
                )
                .await?;
                wallets::apply(
                    &mut tx,
                    &wallet,
                    NewWalletTransaction {
                        kind: WalletTxKind::Purchase,
                        amount: -order.amount,
                        reference: &order.reference,
                        description: Some(&product.name),
                    },
                )
                .await?;
                tx.commit().await?;

                info!(reference = %order.reference, amount = %order.amount, "Wallet order paid");
                let order = self.fulfillment().dispatch(&order).await?;
                Ok(PlacedOrder {
                    order: order.into(),
                    authorization_url: None,
                })
            }
            PaymentMethod::Paystack => {
                let email = match customer {
                    Some(c) => c.email.clone(),
                    None => Email::parse(checkout.email.ok_or_else(|| {
                        AppError::BadRequest("email is required for card payments".to_string())
                    })?)?,
                };

                let mut conn = self.pool.acquire().await?;
                let order = orders::insert(
                    &mut conn,
                    NewOrder {
                        customer_email: Some(email.as_str()),
                        ..draft
                    },
                )
                .await?;
                drop(conn);

                let metadata = serde_json::to_value(OrderMetadata {
                    kind: "order",
                    store_id: store.id.to_string(),
                    reference: &order.reference,
                })
                .map_err(|e| AppError::Internal(e.to_string()))?;

                match self
                    .paystack
                    .initialize(email.as_str(), order.amount, &order.reference, metadata)
                    .await
                {
                    Ok(checkout) => {
                        info!(reference = %order.reference, "Gateway order created");
                        Ok(PlacedOrder {
                            order: order.into(),
                            authorization_url: Some(checkout.authorization_url),
                        })
                    }
                    Err(e) => {
                        self.abandon(order.id, "payment could not be started").await?;
                        Err(e.into())
                    }
                }
            }
        }
    }

    /// Confirm a gateway payment, then fulfill the order.
    ///
    /// Safe to call repeatedly; the verify endpoint and the webhook both land
    /// here. A charge that lands after the order was cancelled is recorded
    /// and refunded instead of fulfilled.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown reference and
    /// `AppError::Conflict` if the gateway reports a different amount.
    #[instrument(skip(self))]
    pub async fn confirm_payment(&self, reference: &str) -> Result<OrderTracking> {
        let order = OrderRepository::new(self.pool)
            .get_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::NotFound("order".to_string()))?;

        if order.payment_method != PaymentMethod::Paystack {
            return Err(AppError::BadRequest("order is not a card payment".to_string()));
        }
        if !awaits_charge(&order) {
            return Ok(order.into());
        }

        let verified = self.paystack.verify(reference).await?;

        let mut tx = self.pool.begin().await?;
        let order = orders::lock(&mut tx, order.id).await?;
        if !awaits_charge(&order) {
            tx.commit().await?;
            return Ok(order.into());
        }

        if verified.confirms(order.amount) {
            if order.order_status == OrderStatus::Cancelled {
                let state = order.state().paid_after_cancel()?;
                let state = fulfillment::refund_held(&mut tx, &order, state).await?;
                let settled = orders::update_state(
                    &mut tx,
                    order.id,
                    state,
                    OrderUpdate {
                        vendor_reference: None,
                        failure_reason: Some("paid after cancellation"),
                    },
                )
                .await?;
                tx.commit().await?;

                warn!(
                    reference = %settled.reference,
                    payment_status = %settled.payment_status,
                    "Gateway payment confirmed for a cancelled order"
                );
                return Ok(settled.into());
            }

            let state = order
                .state()
                .mark_paid()?
                .transition(OrderStatus::Processing)?;
            let paid =
                orders::update_state(&mut tx, order.id, state, OrderUpdate::default()).await?;
            tx.commit().await?;

            info!(reference = %paid.reference, "Gateway payment confirmed");
            let order = self.fulfillment().dispatch(&paid).await?;
            return Ok(order.into());
        }

        if verified.is_failed() && order.order_status == OrderStatus::Pending {
            let state = order.state().payment_failed()?;
            let failed = orders::update_state(
                &mut tx,
                order.id,
                state,
                OrderUpdate {
                    vendor_reference: None,
                    failure_reason: Some("payment failed"),
                },
            )
            .await?;
            tx.commit().await?;
            info!(reference = %failed.reference, status = %verified.status, "Gateway payment failed");
            return Ok(failed.into());
        }

        tx.commit().await?;
        if verified.is_success() {
            warn!(
                reference = %order.reference,
                paid = %verified.amount(),
                currency = %verified.currency,
                expected = %order.amount,
                "Gateway payment does not match order"
            );
            return Err(AppError::Conflict(
                "payment does not match the order amount".to_string(),
            ));
        }

        // Still in progress on the gateway side, or already cancelled here
        Ok(order.into())
    }

    /// Public tracking view of an order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown reference.
    pub async fn track(&self, reference: &str) -> Result<OrderTracking> {
        OrderRepository::new(self.pool)
            .get_by_reference(reference)
            .await?
            .map(OrderTracking::from)
            .ok_or_else(|| AppError::NotFound("order".to_string()))
    }

    /// Orders of the agent's store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the agent has no store.
    pub async fn list_for_agent(
        &self,
        owner: UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let store = owned_store(self.pool, owner).await?;
        Ok(OrderRepository::new(self.pool)
            .list_for_store(store.id, status, LIST_LIMIT)
            .await?)
    }

    /// Agent-driven status change for manual fulfillment.
    ///
    /// `completed` credits the store, `failed` and `cancelled` refund a paid
    /// order, `processing` retries a failed order through the vendor.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order is not in the agent's store
    /// and `AppError::Transition` for an illegal move.
    #[instrument(skip(self, failure_reason))]
    pub async fn set_status(
        &self,
        owner: UserId,
        order_id: OrderId,
        next: OrderStatus,
        failure_reason: Option<&str>,
    ) -> Result<Order> {
        let store = owned_store(self.pool, owner).await?;

        let mut tx = self.pool.begin().await?;
        let order = match orders::lock(&mut tx, order_id).await {
            Ok(order) if order.store_id == store.id => order,
            Ok(_) | Err(crate::db::RepositoryError::NotFound) => {
                return Err(AppError::NotFound("order".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let updated = match next {
            OrderStatus::Completed => fulfillment::complete(&mut tx, &order, None).await?,
            OrderStatus::Failed | OrderStatus::Cancelled => {
                fulfillment::stop(&mut tx, &order, next, failure_reason).await?
            }
            OrderStatus::Processing | OrderStatus::Pending => {
                let state = order.state().transition(next)?;
                orders::update_state(&mut tx, order.id, state, OrderUpdate::default()).await?
            }
        };
        tx.commit().await?;

        info!(
            reference = %updated.reference,
            from = %order.order_status,
            to = %updated.order_status,
            "Agent changed order status"
        );

        if updated.order_status == OrderStatus::Processing {
            return self.fulfillment().dispatch(&updated).await;
        }
        Ok(updated)
    }

    /// Cancel an unpaid gateway order whose checkout could not be created.
    async fn abandon(&self, order_id: OrderId, reason: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let order = orders::lock(&mut tx, order_id).await?;
        let state = order.state().payment_failed()?;
        orders::update_state(
            &mut tx,
            order.id,
            state,
            OrderUpdate {
                vendor_reference: None,
                failure_reason: Some(reason),
            },
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }
}

/// No charge has been recorded yet: the order is unpaid, or it was
/// cancelled before the gateway reported success.
fn awaits_charge(order: &Order) -> bool {
    match order.payment_status {
        PaymentStatus::Pending => true,
        PaymentStatus::Failed => order.order_status == OrderStatus::Cancelled,
        PaymentStatus::Paid | PaymentStatus::Refunded => false,
    }
}

/// An approved store by slug; anything else is hidden from customers.
pub(crate) async fn open_store(pool: &PgPool, slug: &Slug) -> Result<Store> {
    StoreRepository::new(pool)
        .get_by_slug(slug)
        .await?
        .filter(|s| s.status.is_open())
        .ok_or_else(|| AppError::NotFound("store".to_string()))
}

/// The store owned by an agent.
pub(crate) async fn owned_store(pool: &PgPool, owner: UserId) -> Result<Store> {
    StoreRepository::new(pool)
        .get_by_owner(owner)
        .await?
        .ok_or_else(|| AppError::NotFound("store".to_string()))
}
