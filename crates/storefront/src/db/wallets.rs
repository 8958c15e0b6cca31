//! Customer wallet repository.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use bundlehub_core::{UserId, WalletId, WalletTransactionId, WalletTxKind};

use super::RepositoryError;
use crate::models::{CustomerWallet, WalletTransaction};

const WALLET_COLUMNS: &str = "id, user_id, balance, created_at, updated_at";
const TX_COLUMNS: &str =
    "id, wallet_id, kind, amount, balance_after, reference, description, created_at";

/// A wallet movement to record.
#[derive(Debug)]
pub struct NewWalletTransaction<'a> {
    pub kind: WalletTxKind,
    /// Signed: negative debits the wallet
    pub amount: Decimal,
    pub reference: &'a str,
    pub description: Option<&'a str>,
}

/// Ensure a user has a wallet, then lock it for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn lock_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<CustomerWallet, RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO bundlehub.customer_wallet (id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO NOTHING
        ",
    )
    .bind(WalletId::new())
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, CustomerWallet>(&format!(
        "SELECT {WALLET_COLUMNS} FROM bundlehub.customer_wallet WHERE user_id = $1 FOR UPDATE"
    ))
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(RepositoryError::from)
}

/// Apply a movement to a wallet locked by [`lock_for_user`] and record it.
///
/// The caller checks the resulting balance is not negative; the table's
/// check constraint backs that up.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the reference was already recorded.
pub async fn apply(
    conn: &mut PgConnection,
    wallet: &CustomerWallet,
    tx: NewWalletTransaction<'_>,
) -> Result<(CustomerWallet, WalletTransaction), RepositoryError> {
    let balance_after = wallet.balance + tx.amount;

    let record = sqlx::query_as::<_, WalletTransaction>(&format!(
        r"
        INSERT INTO bundlehub.wallet_transaction
            (id, wallet_id, kind, amount, balance_after, reference, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {TX_COLUMNS}
        "
    ))
    .bind(WalletTransactionId::new())
    .bind(wallet.id)
    .bind(tx.kind)
    .bind(tx.amount)
    .bind(balance_after)
    .bind(tx.reference)
    .bind(tx.description)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| RepositoryError::unique(e, "wallet transaction already recorded"))?;

    let updated = sqlx::query_as::<_, CustomerWallet>(&format!(
        r"
        UPDATE bundlehub.customer_wallet SET balance = $2, updated_at = now()
        WHERE id = $1
        RETURNING {WALLET_COLUMNS}
        "
    ))
    .bind(wallet.id)
    .bind(balance_after)
    .fetch_one(&mut *conn)
    .await?;

    Ok((updated, record))
}

/// Whether a wallet transaction with this reference exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn reference_exists(
    conn: &mut PgConnection,
    reference: &str,
) -> Result<bool, RepositoryError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM bundlehub.wallet_transaction WHERE reference = $1)",
    )
    .bind(reference)
    .fetch_one(&mut *conn)
    .await?;

    Ok(exists)
}

/// Repository for customer wallet reads.
pub struct WalletRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WalletRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's wallet, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<CustomerWallet, RepositoryError> {
        let wallet = sqlx::query_as::<_, CustomerWallet>(&format!(
            r"
            INSERT INTO bundlehub.customer_wallet (id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {WALLET_COLUMNS}
            "
        ))
        .bind(WalletId::new())
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(wallet)
    }

    /// Most recent transactions on a wallet, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_transactions(
        &self,
        wallet_id: WalletId,
        limit: i64,
    ) -> Result<Vec<WalletTransaction>, RepositoryError> {
        let transactions = sqlx::query_as::<_, WalletTransaction>(&format!(
            r"
            SELECT {TX_COLUMNS} FROM bundlehub.wallet_transaction
            WHERE wallet_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "
        ))
        .bind(wallet_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(transactions)
    }
}
