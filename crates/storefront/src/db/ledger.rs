//! Store ledger: one row per wallet mutation.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use bundlehub_core::{LedgerEntryId, LedgerKind, StoreId, StoreWallet, UserId};

use super::RepositoryError;
use crate::models::LedgerEntry;

const LEDGER_COLUMNS: &str = "id, store_id, kind, amount, available_after, pending_after, \
     earned_after, withdrawn_after, reference, note, created_by, created_at";

/// A ledger row to append.
#[derive(Debug)]
pub struct NewLedgerEntry<'a> {
    pub store_id: StoreId,
    pub kind: LedgerKind,
    pub amount: Decimal,
    /// Balances after the mutation was applied
    pub wallet: &'a StoreWallet,
    pub reference: Option<&'a str>,
    pub note: Option<&'a str>,
    pub created_by: Option<UserId>,
}

/// Append a ledger row.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if a sale with this reference was
/// already credited.
pub async fn insert(
    conn: &mut PgConnection,
    entry: NewLedgerEntry<'_>,
) -> Result<LedgerEntry, RepositoryError> {
    sqlx::query_as::<_, LedgerEntry>(&format!(
        r"
        INSERT INTO bundlehub.store_ledger
            (id, store_id, kind, amount, available_after, pending_after, earned_after,
             withdrawn_after, reference, note, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {LEDGER_COLUMNS}
        "
    ))
    .bind(LedgerEntryId::new())
    .bind(entry.store_id)
    .bind(entry.kind)
    .bind(entry.amount)
    .bind(entry.wallet.available)
    .bind(entry.wallet.pending)
    .bind(entry.wallet.earned)
    .bind(entry.wallet.withdrawn)
    .bind(entry.reference)
    .bind(entry.note)
    .bind(entry.created_by)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| RepositoryError::unique(e, "sale already credited"))
}

/// Repository for reading the ledger.
pub struct LedgerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LedgerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Most recent entries for a store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(
        &self,
        store_id: StoreId,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(&format!(
            r"
            SELECT {LEDGER_COLUMNS}
            FROM bundlehub.store_ledger
            WHERE store_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "
        ))
        .bind(store_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }
}
