//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bundlehub_core::{
    Network, OrderId, OrderState, OrderStatus, PaymentMethod, PaymentStatus, PhoneNumber,
    ProductId, StoreId, UserId,
};

/// A bundle purchase from a store.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub store_id: StoreId,
    pub product_id: ProductId,
    /// `None` for guest checkouts
    pub customer_id: Option<UserId>,
    pub customer_email: Option<String>,
    pub recipient_phone: PhoneNumber,
    pub network: Network,
    pub package_code: String,
    pub amount: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub reference: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub vendor_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub const fn state(&self) -> OrderState {
        OrderState::new(self.payment_status, self.order_status)
    }
}

/// Order fields a customer may see when tracking by reference.
#[derive(Debug, Clone, Serialize)]
pub struct OrderTracking {
    pub reference: String,
    pub network: Network,
    pub recipient_phone: PhoneNumber,
    pub amount: Decimal,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderTracking {
    fn from(order: Order) -> Self {
        Self {
            reference: order.reference,
            network: order.network,
            recipient_phone: order.recipient_phone,
            amount: order.amount,
            payment_status: order.payment_status,
            order_status: order.order_status,
            failure_reason: order.failure_reason,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
