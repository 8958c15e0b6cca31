//! Withdrawal repository.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use bundlehub_core::{Network, StoreId, UserId, WithdrawalId, WithdrawalStatus};

use super::RepositoryError;
use crate::models::Withdrawal;

const WITHDRAWAL_COLUMNS: &str = "id, store_id, amount, network, account_number, account_name, \
     status, admin_note, processed_by, processed_at, created_at, updated_at";

/// Fields for a new withdrawal request.
#[derive(Debug)]
pub struct NewWithdrawal<'a> {
    pub store_id: StoreId,
    pub amount: Decimal,
    pub network: Network,
    pub account_number: &'a str,
    pub account_name: &'a str,
}

/// Insert a pending withdrawal.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the store already has a pending
/// withdrawal.
pub async fn insert(
    conn: &mut PgConnection,
    new: NewWithdrawal<'_>,
) -> Result<Withdrawal, RepositoryError> {
    sqlx::query_as::<_, Withdrawal>(&format!(
        r"
        INSERT INTO bundlehub.withdrawal (id, store_id, amount, network, account_number, account_name)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {WITHDRAWAL_COLUMNS}
        "
    ))
    .bind(WithdrawalId::new())
    .bind(new.store_id)
    .bind(new.amount)
    .bind(new.network)
    .bind(new.account_number)
    .bind(new.account_name)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| RepositoryError::unique(e, "a withdrawal is already pending for this store"))
}

/// Lock a withdrawal for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the withdrawal doesn't exist.
pub async fn lock(conn: &mut PgConnection, id: WithdrawalId) -> Result<Withdrawal, RepositoryError> {
    sqlx::query_as::<_, Withdrawal>(&format!(
        "SELECT {WITHDRAWAL_COLUMNS} FROM bundlehub.withdrawal WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Record the admin's decision on a locked withdrawal.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn process(
    conn: &mut PgConnection,
    id: WithdrawalId,
    status: WithdrawalStatus,
    admin: UserId,
    note: Option<&str>,
) -> Result<Withdrawal, RepositoryError> {
    sqlx::query_as::<_, Withdrawal>(&format!(
        r"
        UPDATE bundlehub.withdrawal
        SET status = $2, processed_by = $3, admin_note = $4, processed_at = now(),
            updated_at = now()
        WHERE id = $1
        RETURNING {WITHDRAWAL_COLUMNS}
        "
    ))
    .bind(id)
    .bind(status)
    .bind(admin)
    .bind(note)
    .fetch_one(&mut *conn)
    .await
    .map_err(RepositoryError::from)
}

/// Repository for withdrawal reads.
pub struct WithdrawalRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WithdrawalRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Withdrawals of one store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<Withdrawal>, RepositoryError> {
        let withdrawals = sqlx::query_as::<_, Withdrawal>(&format!(
            r"
            SELECT {WITHDRAWAL_COLUMNS} FROM bundlehub.withdrawal
            WHERE store_id = $1
            ORDER BY created_at DESC
            "
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(withdrawals)
    }

    /// All withdrawals, oldest first so the admin queue is FIFO.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<WithdrawalStatus>,
    ) -> Result<Vec<Withdrawal>, RepositoryError> {
        let withdrawals = sqlx::query_as::<_, Withdrawal>(&format!(
            r"
            SELECT {WITHDRAWAL_COLUMNS} FROM bundlehub.withdrawal
            WHERE $1::bundlehub.withdrawal_status IS NULL OR status = $1
            ORDER BY created_at
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(withdrawals)
    }

    /// Number of withdrawals awaiting a decision and their total amount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn pending_summary(&self) -> Result<(i64, Decimal), RepositoryError> {
        let summary = sqlx::query_as::<_, (i64, Decimal)>(
            r"
            SELECT COUNT(*), COALESCE(SUM(amount), 0)
            FROM bundlehub.withdrawal
            WHERE status = 'pending'
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(summary)
    }
}
