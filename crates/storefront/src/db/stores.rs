//! Store repository, including the wallet columns.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use bundlehub_core::{PhoneNumber, Slug, StoreId, StoreStatus, StoreWallet, UserId};

use super::RepositoryError;
use crate::models::Store;

const STORE_COLUMNS: &str = "id, owner_id, name, slug, description, logo, contact_phone, \
     status, rejection_reason, approved_at, wallet_available, wallet_pending, wallet_earned, \
     wallet_withdrawn, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    owner_id: UserId,
    name: String,
    slug: Slug,
    description: Option<String>,
    logo: Option<String>,
    contact_phone: PhoneNumber,
    status: StoreStatus,
    rejection_reason: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    wallet_available: Decimal,
    wallet_pending: Decimal,
    wallet_earned: Decimal,
    wallet_withdrawn: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(r: StoreRow) -> Self {
        Self {
            id: r.id,
            owner_id: r.owner_id,
            name: r.name,
            slug: r.slug,
            description: r.description,
            logo: r.logo,
            contact_phone: r.contact_phone,
            status: r.status,
            rejection_reason: r.rejection_reason,
            approved_at: r.approved_at,
            wallet: StoreWallet {
                available: r.wallet_available,
                pending: r.wallet_pending,
                earned: r.wallet_earned,
                withdrawn: r.wallet_withdrawn,
            },
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct WalletRow {
    wallet_available: Decimal,
    wallet_pending: Decimal,
    wallet_earned: Decimal,
    wallet_withdrawn: Decimal,
}

/// Fields for a new store.
#[derive(Debug)]
pub struct NewStore<'a> {
    pub owner_id: UserId,
    pub name: &'a str,
    pub slug: &'a Slug,
    pub description: Option<&'a str>,
    pub contact_phone: &'a PhoneNumber,
}

/// Editable store fields; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct StoreChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub contact_phone: Option<&'a PhoneNumber>,
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM bundlehub.store WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Store::from))
    }

    /// Get the store an agent owns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_owner(&self, owner_id: UserId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM bundlehub.store WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Store::from))
    }

    /// Get a store by slug, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM bundlehub.store WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Store::from))
    }

    /// List stores, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, status: Option<StoreStatus>) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            SELECT {STORE_COLUMNS} FROM bundlehub.store
            WHERE $1::bundlehub.store_status IS NULL OR status = $1
            ORDER BY created_at DESC
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    /// Create a store in `pending_approval` with an empty wallet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken or the owner
    /// already has a store.
    pub async fn create(&self, new: NewStore<'_>) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            INSERT INTO bundlehub.store (id, owner_id, name, slug, description, contact_phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(StoreId::new())
        .bind(new.owner_id)
        .bind(new.name)
        .bind(new.slug)
        .bind(new.description)
        .bind(new.contact_phone)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                let message = if db_err.constraint() == Some("store_slug_key") {
                    "slug already taken"
                } else {
                    "agent already has a store"
                };
                return RepositoryError::Conflict(message.to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Update editable fields. A rejected store goes back to
    /// `pending_approval` so it can be reviewed again.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    pub async fn update_details(
        &self,
        id: StoreId,
        changes: StoreChanges<'_>,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            UPDATE bundlehub.store
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                contact_phone = COALESCE($4, contact_phone),
                status = CASE WHEN status = 'rejected' THEN 'pending_approval' ELSE status END,
                rejection_reason = CASE WHEN status = 'rejected' THEN NULL ELSE rejection_reason END,
                updated_at = now()
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.contact_phone)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Replace the store logo.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    pub async fn set_logo(&self, id: StoreId, logo: &str) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            UPDATE bundlehub.store SET logo = $2, updated_at = now()
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(logo)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Move a store from `from` to `to`, only if it is still in `from`.
    ///
    /// Returns `None` when the store is missing or its status changed
    /// concurrently. `reason` is stored for rejections and cleared otherwise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_status(
        &self,
        id: StoreId,
        from: StoreStatus,
        to: StoreStatus,
        reason: Option<&str>,
    ) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            UPDATE bundlehub.store
            SET status = $3,
                rejection_reason = $4,
                approved_at = CASE WHEN $3 = 'approved' THEN COALESCE(approved_at, now())
                                   ELSE approved_at END,
                updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(reason)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Store::from))
    }

    /// Number of stores in each status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<Vec<(StoreStatus, i64)>, RepositoryError> {
        let rows = sqlx::query_as::<_, (StoreStatus, i64)>(
            "SELECT status, COUNT(*) FROM bundlehub.store GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// Lock a store row and read its wallet.
///
/// The lock is held until the surrounding transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the store doesn't exist.
pub async fn lock_wallet(
    conn: &mut PgConnection,
    id: StoreId,
) -> Result<StoreWallet, RepositoryError> {
    let row = sqlx::query_as::<_, WalletRow>(
        r"
        SELECT wallet_available, wallet_pending, wallet_earned, wallet_withdrawn
        FROM bundlehub.store
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Ok(StoreWallet {
        available: row.wallet_available,
        pending: row.wallet_pending,
        earned: row.wallet_earned,
        withdrawn: row.wallet_withdrawn,
    })
}

/// Write wallet balances for a store locked by [`lock_wallet`].
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn save_wallet(
    conn: &mut PgConnection,
    id: StoreId,
    wallet: &StoreWallet,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE bundlehub.store
        SET wallet_available = $2, wallet_pending = $3, wallet_earned = $4,
            wallet_withdrawn = $5, updated_at = now()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(wallet.available)
    .bind(wallet.pending)
    .bind(wallet.earned)
    .bind(wallet.withdrawn)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
