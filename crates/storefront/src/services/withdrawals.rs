//! Store withdrawals.
//!
//! Requesting a withdrawal holds the amount in the store's pending balance.
//! An admin then approves it (paid out manually, recorded here) or rejects
//! it (returned to available).

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use bundlehub_core::{LedgerKind, Network, UserId, WithdrawalId, WithdrawalStatus};

use crate::db::WithdrawalRepository;
use crate::db::withdrawals::{self, NewWithdrawal};
use crate::error::{AppError, Result};
use crate::models::Withdrawal;
use crate::services::orders::owned_store;
use crate::services::store_wallet::{self, Movement};

/// Cash-out request form.
#[derive(Debug)]
pub struct WithdrawalRequest<'a> {
    pub amount: Decimal,
    pub network: Network,
    pub account_number: &'a str,
    pub account_name: &'a str,
}

pub struct WithdrawalService<'a> {
    pool: &'a PgPool,
    min_amount: Decimal,
}

impl<'a> WithdrawalService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, min_amount: Decimal) -> Self {
        Self { pool, min_amount }
    }

    /// Request a withdrawal from the agent's approved store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` below the minimum amount,
    /// `AppError::Forbidden` for a store that is not approved,
    /// `AppError::Conflict` if one is already pending and `AppError::Wallet`
    /// if the available balance is too low.
    #[instrument(skip(self, request), fields(amount = %request.amount))]
    pub async fn request(&self, owner: UserId, request: WithdrawalRequest<'_>) -> Result<Withdrawal> {
        if request.amount < self.min_amount {
            return Err(AppError::BadRequest(format!(
                "minimum withdrawal is {}",
                self.min_amount
            )));
        }
        let account_number = required(request.account_number, "account_number")?;
        let account_name = required(request.account_name, "account_name")?;

        let store = owned_store(self.pool, owner).await?;
        if !store.status.is_open() {
            return Err(AppError::Forbidden("store is not approved".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        let withdrawal = withdrawals::insert(
            &mut tx,
            NewWithdrawal {
                store_id: store.id,
                amount: request.amount,
                network: request.network,
                account_number,
                account_name,
            },
        )
        .await?;
        let reference = withdrawal.id.to_string();
        store_wallet::apply(
            &mut tx,
            store.id,
            Movement {
                kind: LedgerKind::WithdrawalHold,
                amount: withdrawal.amount,
                reference: Some(&reference),
                note: None,
                created_by: Some(owner),
            },
        )
        .await?;
        tx.commit().await?;

        info!(store_id = %store.id, withdrawal_id = %withdrawal.id, "Withdrawal requested");
        Ok(withdrawal)
    }

    /// Withdrawals of the agent's store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the agent has no store.
    pub async fn list_for_agent(&self, owner: UserId) -> Result<Vec<Withdrawal>> {
        let store = owned_store(self.pool, owner).await?;
        Ok(WithdrawalRepository::new(self.pool)
            .list_for_store(store.id)
            .await?)
    }

    /// All withdrawals, oldest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, status: Option<WithdrawalStatus>) -> Result<Vec<Withdrawal>> {
        Ok(WithdrawalRepository::new(self.pool).list(status).await?)
    }

    /// Approve a pending withdrawal; the held amount counts as withdrawn.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` unless the withdrawal is pending.
    pub async fn approve(
        &self,
        id: WithdrawalId,
        admin: UserId,
        note: Option<&str>,
    ) -> Result<Withdrawal> {
        self.decide(id, admin, WithdrawalStatus::Approved, note).await
    }

    /// Reject a pending withdrawal; the held amount returns to available.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` without a note and
    /// `AppError::Conflict` unless the withdrawal is pending.
    pub async fn reject(&self, id: WithdrawalId, admin: UserId, note: &str) -> Result<Withdrawal> {
        let note = required(note, "note")?;
        self.decide(id, admin, WithdrawalStatus::Rejected, Some(note))
            .await
    }

    #[instrument(skip(self, note))]
    async fn decide(
        &self,
        id: WithdrawalId,
        admin: UserId,
        next: WithdrawalStatus,
        note: Option<&str>,
    ) -> Result<Withdrawal> {
        let kind = match next {
            WithdrawalStatus::Approved => LedgerKind::WithdrawalPaid,
            WithdrawalStatus::Rejected => LedgerKind::WithdrawalReleased,
            WithdrawalStatus::Pending => {
                return Err(AppError::BadRequest("invalid decision".to_string()));
            }
        };
        let note = note.map(str::trim).filter(|n| !n.is_empty());

        let mut tx = self.pool.begin().await?;
        let withdrawal = withdrawals::lock(&mut tx, id).await?;
        if !withdrawal.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "withdrawal is already {}",
                withdrawal.status
            )));
        }

        let reference = withdrawal.id.to_string();
        store_wallet::apply(
            &mut tx,
            withdrawal.store_id,
            Movement {
                kind,
                amount: withdrawal.amount,
                reference: Some(&reference),
                note,
                created_by: Some(admin),
            },
        )
        .await?;
        let processed = withdrawals::process(&mut tx, id, next, admin, note).await?;
        tx.commit().await?;

        info!(
            withdrawal_id = %id,
            store_id = %processed.store_id,
            status = %processed.status,
            "Withdrawal processed"
        );
        Ok(processed)
    }
}

fn required<'s>(value: &'s str, field: &str) -> Result<&'s str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value)
}
