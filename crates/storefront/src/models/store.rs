//! Store domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bundlehub_core::{
    LedgerEntryId, LedgerKind, PhoneNumber, Slug, StoreId, StoreStatus, StoreWallet, UserId,
};

/// An agent's store, including its wallet.
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub owner_id: UserId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    /// `data:` URL of the logo image
    pub logo: Option<String>,
    pub contact_phone: PhoneNumber,
    pub status: StoreStatus,
    pub rejection_reason: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub wallet: StoreWallet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What customers see of a store.
#[derive(Debug, Clone, Serialize)]
pub struct PublicStore {
    pub id: StoreId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub contact_phone: PhoneNumber,
}

impl From<Store> for PublicStore {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            name: store.name,
            slug: store.slug,
            description: store.description,
            logo: store.logo,
            contact_phone: store.contact_phone,
        }
    }
}

/// One row of the store wallet ledger.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub store_id: StoreId,
    pub kind: LedgerKind,
    /// Signed for adjustments, positive otherwise
    pub amount: Decimal,
    pub available_after: Decimal,
    pub pending_after: Decimal,
    pub earned_after: Decimal,
    pub withdrawn_after: Decimal,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}
