//! Dashboard figures for agents and admins.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use bundlehub_core::{StoreStatus, StoreWallet, UserId};

use crate::db::orders::OrderTotals;
use crate::db::{OrderRepository, StoreRepository, WithdrawalRepository};
use crate::error::Result;
use crate::services::orders::owned_store;

#[derive(Debug, Serialize)]
pub struct AgentStats {
    pub orders: OrderTotals,
    pub wallet: StoreWallet,
}

#[derive(Debug, Default, Serialize)]
pub struct StoreCounts {
    pub pending_approval: i64,
    pub approved: i64,
    pub rejected: i64,
    pub suspended: i64,
}

impl StoreCounts {
    fn from_rows(rows: &[(StoreStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            match status {
                StoreStatus::PendingApproval => counts.pending_approval = *count,
                StoreStatus::Approved => counts.approved = *count,
                StoreStatus::Rejected => counts.rejected = *count,
                StoreStatus::Suspended => counts.suspended = *count,
            }
        }
        counts
    }
}

#[derive(Debug, Serialize)]
pub struct PendingWithdrawals {
    pub count: i64,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub stores: StoreCounts,
    pub pending_withdrawals: PendingWithdrawals,
    pub orders: OrderTotals,
}

/// Order counts, revenue and profit of the agent's store, plus its wallet.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the agent has no store.
pub async fn for_agent(pool: &PgPool, owner: UserId) -> Result<AgentStats> {
    let store = owned_store(pool, owner).await?;
    let orders = OrderRepository::new(pool).totals(Some(store.id)).await?;
    Ok(AgentStats {
        orders,
        wallet: store.wallet,
    })
}

/// Platform-wide figures.
///
/// # Errors
///
/// Returns `AppError::Database` if a query fails.
pub async fn for_admin(pool: &PgPool) -> Result<AdminStats> {
    let stores = StoreRepository::new(pool).count_by_status().await?;
    let (count, amount) = WithdrawalRepository::new(pool).pending_summary().await?;
    let orders = OrderRepository::new(pool).totals(None).await?;

    Ok(AdminStats {
        stores: StoreCounts::from_rows(&stores),
        pending_withdrawals: PendingWithdrawals { count, amount },
        orders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_counts_fill_missing_with_zero() {
        let counts = StoreCounts::from_rows(&[
            (StoreStatus::Approved, 4),
            (StoreStatus::PendingApproval, 2),
        ]);
        assert_eq!(counts.approved, 4);
        assert_eq!(counts.pending_approval, 2);
        assert_eq!(counts.rejected, 0);
        assert_eq!(counts.suspended, 0);
    }
}
