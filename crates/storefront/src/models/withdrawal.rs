//! Withdrawal domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bundlehub_core::{Network, StoreId, UserId, WithdrawalId, WithdrawalStatus};

/// A store's request to cash out part of its available balance.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub store_id: StoreId,
    pub amount: Decimal,
    /// Mobile money network of the payout account
    pub network: Network,
    pub account_number: String,
    pub account_name: String,
    pub status: WithdrawalStatus,
    pub admin_note: Option<String>,
    pub processed_by: Option<UserId>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
