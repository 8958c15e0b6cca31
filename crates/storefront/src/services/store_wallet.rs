//! Ledger-backed store wallet mutations.
//!
//! Every change locks the store row, applies the [`StoreWallet`] operation,
//! writes the new balances and appends a `store_ledger` row. Callers run it
//! inside the transaction that also records the cause (order completion,
//! withdrawal decision, admin adjustment).

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use bundlehub_core::{LedgerKind, StoreId, StoreWallet, UserId};

use crate::db::ledger::{self, NewLedgerEntry};
use crate::db::stores;
use crate::error::{AppError, Result};
use crate::models::LedgerEntry;

/// One wallet change and what caused it.
#[derive(Debug, Clone, Copy)]
pub struct Movement<'a> {
    pub kind: LedgerKind,
    pub amount: Decimal,
    pub reference: Option<&'a str>,
    pub note: Option<&'a str>,
    pub created_by: Option<UserId>,
}

/// Apply `movement` to a store's wallet within the caller's transaction.
///
/// # Errors
///
/// Returns `AppError::Wallet` if a balance would go negative; nothing is
/// written in that case.
#[instrument(skip(conn, movement), fields(kind = %movement.kind, amount = %movement.amount))]
pub async fn apply(
    conn: &mut PgConnection,
    store_id: StoreId,
    movement: Movement<'_>,
) -> Result<(StoreWallet, LedgerEntry)> {
    let wallet = stores::lock_wallet(&mut *conn, store_id).await?;
    let next = wallet.apply(movement.kind, movement.amount)?;

    stores::save_wallet(&mut *conn, store_id, &next).await?;
    let entry = ledger::insert(
        &mut *conn,
        NewLedgerEntry {
            store_id,
            kind: movement.kind,
            amount: movement.amount,
            wallet: &next,
            reference: movement.reference,
            note: movement.note,
            created_by: movement.created_by,
        },
    )
    .await?;

    Ok((next, entry))
}

/// Admin correction of a store's available balance.
///
/// # Errors
///
/// Returns `AppError::BadRequest` without a note and `AppError::Wallet` if
/// the balance would go negative.
#[instrument(skip(pool, note))]
pub async fn adjust(
    pool: &PgPool,
    store_id: StoreId,
    delta: Decimal,
    note: &str,
    admin: UserId,
) -> Result<(StoreWallet, LedgerEntry)> {
    let note = note.trim();
    if note.is_empty() {
        return Err(AppError::BadRequest("note is required".to_string()));
    }

    let mut tx = pool.begin().await?;
    let result = apply(
        &mut tx,
        store_id,
        Movement {
            kind: LedgerKind::Adjustment,
            amount: delta,
            reference: None,
            note: Some(note),
            created_by: Some(admin),
        },
    )
    .await?;
    tx.commit().await?;

    info!(store_id = %store_id, delta = %delta, admin = %admin, "Store wallet adjusted");
    Ok(result)
}
