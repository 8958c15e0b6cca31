//! Customer wallet domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bundlehub_core::{UserId, WalletId, WalletTransactionId, WalletTxKind};

/// A customer's spendable balance.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerWallet {
    pub id: WalletId,
    pub user_id: UserId,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A movement on a customer wallet.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WalletTransaction {
    pub id: WalletTransactionId,
    pub wallet_id: WalletId,
    pub kind: WalletTxKind,
    /// Positive for deposits and refunds, negative for purchases
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub reference: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
