//! Status and classification enums for stores, orders, withdrawals and wallets.
//!
//! Every enum here is stored as a `PostgreSQL` enum type in the `bundlehub`
//! schema (with the `postgres` feature) and serialized as `snake_case` JSON.
//! Lifecycle enums expose `can_transition_to` so handlers never flip a status
//! string without checking the move is legal.

use serde::{Deserialize, Serialize};

/// Implements `as_str`, `Display` and `FromStr` from a variant/text table.
macro_rules! impl_str_conversions {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// The wire/database representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

/// Account role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bundlehub.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Buys bundles and holds a customer wallet.
    #[default]
    Customer,
    /// Runs a store.
    Agent,
    /// Approves stores and withdrawals.
    Admin,
}

impl_str_conversions!(UserRole {
    Customer => "customer",
    Agent => "agent",
    Admin => "admin",
});

/// Store approval lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bundlehub.store_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    #[default]
    PendingApproval,
    Approved,
    Rejected,
    Suspended,
}

impl_str_conversions!(StoreStatus {
    PendingApproval => "pending_approval",
    Approved => "approved",
    Rejected => "rejected",
    Suspended => "suspended",
});

impl StoreStatus {
    /// Whether a store may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::PendingApproval, Self::Approved | Self::Rejected)
                | (Self::Approved, Self::Suspended)
                | (Self::Rejected, Self::PendingApproval)
                | (Self::Suspended, Self::Approved)
        )
    }

    /// Only approved stores are visible to customers and may take orders.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Mobile network a bundle is sold on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bundlehub.network", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mtn,
    Telecel,
    AirtelTigo,
}

impl_str_conversions!(Network {
    Mtn => "mtn",
    Telecel => "telecel",
    AirtelTigo => "airteltigo",
});

/// How an order was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bundlehub.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Debited from the customer wallet.
    Wallet,
    /// Paid through the payment gateway checkout.
    Paystack,
}

impl_str_conversions!(PaymentMethod {
    Wallet => "wallet",
    Paystack => "paystack",
});

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bundlehub.payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl_str_conversions!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

impl PaymentStatus {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid | Self::Failed) | (Self::Paid, Self::Refunded)
        )
    }
}

/// Fulfillment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bundlehub.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl_str_conversions!(OrderStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Fulfillment moves only; payment preconditions live in [`crate::OrderState`].
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Completed | Self::Failed)
                | (Self::Failed, Self::Processing)
        )
    }

    /// No further moves are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Withdrawal request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bundlehub.withdrawal_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl_str_conversions!(WithdrawalStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

impl WithdrawalStatus {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Pending, Self::Approved | Self::Rejected))
    }
}

/// Kind of a customer wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bundlehub.wallet_tx_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum WalletTxKind {
    Deposit,
    Purchase,
    Refund,
}

impl_str_conversions!(WalletTxKind {
    Deposit => "deposit",
    Purchase => "purchase",
    Refund => "refund",
});

/// Kind of a store ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bundlehub.ledger_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    SaleProfit,
    WithdrawalHold,
    WithdrawalPaid,
    WithdrawalReleased,
    Adjustment,
}

impl_str_conversions!(LedgerKind {
    SaleProfit => "sale_profit",
    WithdrawalHold => "withdrawal_hold",
    WithdrawalPaid => "withdrawal_paid",
    WithdrawalReleased => "withdrawal_released",
    Adjustment => "adjustment",
});
