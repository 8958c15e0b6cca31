//! Admin moderation API: store approval, wallet corrections, withdrawals.

use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use bundlehub_core::{StoreId, StoreStatus, StoreWallet, WithdrawalId, WithdrawalStatus};

use crate::db::LedgerRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::routes::extract::{Json, Path, Query};
use crate::models::{LedgerEntry, Store, Withdrawal};
use crate::services::stats::{self, AdminStats};
use crate::services::{StoreService, WithdrawalService, store_wallet};
use crate::state::AppState;

/// Default and largest ledger page.
const LEDGER_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct StoreFilter {
    pub status: Option<StoreStatus>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalFilter {
    pub status: Option<WithdrawalStatus>,
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReasonRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentRequest {
    /// Signed; negative takes money out of `available`
    pub amount: Decimal,
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct AdjustmentResponse {
    pub wallet: StoreWallet,
    pub entry: LedgerEntry,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoteRequest {
    pub note: Option<String>,
}

// =============================================================================
// Stores
// =============================================================================

/// GET /api/admin/stores?status=
pub async fn list_stores(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<StoreFilter>,
) -> Result<Json<Vec<Store>>> {
    StoreService::new(state.pool())
        .list(filter.status)
        .await
        .map(Json)
}

/// POST /api/admin/stores/{id}/approve
pub async fn approve_store(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<StoreId>,
) -> Result<Json<Store>> {
    set_store_status(&state, admin.id, id, StoreStatus::Approved, None).await
}

/// POST /api/admin/stores/{id}/reject
pub async fn reject_store(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<StoreId>,
    Json(body): Json<ReasonRequest>,
) -> Result<Json<Store>> {
    set_store_status(&state, admin.id, id, StoreStatus::Rejected, Some(&body.reason)).await
}

/// POST /api/admin/stores/{id}/suspend
pub async fn suspend_store(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<StoreId>,
) -> Result<Json<Store>> {
    set_store_status(&state, admin.id, id, StoreStatus::Suspended, None).await
}

/// A suspended store goes back to `approved`.
///
/// POST /api/admin/stores/{id}/reinstate
pub async fn reinstate_store(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<StoreId>,
) -> Result<Json<Store>> {
    set_store_status(&state, admin.id, id, StoreStatus::Approved, None).await
}

async fn set_store_status(
    state: &AppState,
    admin: bundlehub_core::UserId,
    id: StoreId,
    next: StoreStatus,
    reason: Option<&str>,
) -> Result<Json<Store>> {
    let store = StoreService::new(state.pool())
        .set_status(id, next, reason)
        .await?;
    info!(store_id = %id, admin_id = %admin, status = %next, "Store status changed");
    Ok(Json(store))
}

/// Signed correction of a store's available balance.
///
/// POST /api/admin/stores/{id}/wallet
pub async fn adjust_wallet(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<StoreId>,
    Json(body): Json<AdjustmentRequest>,
) -> Result<Json<AdjustmentResponse>> {
    let (wallet, entry) =
        store_wallet::adjust(state.pool(), id, body.amount, &body.note, admin.id).await?;
    Ok(Json(AdjustmentResponse { wallet, entry }))
}

/// Newest entries first.
///
/// GET /api/admin/stores/{id}/ledger?limit=
pub async fn ledger(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<StoreId>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<Vec<LedgerEntry>>> {
    let limit = query.limit.unwrap_or(LEDGER_LIMIT).clamp(1, LEDGER_LIMIT);
    let entries = LedgerRepository::new(state.pool())
        .list_for_store(id, limit)
        .await?;
    Ok(Json(entries))
}

// =============================================================================
// Withdrawals
// =============================================================================

/// GET /api/admin/withdrawals?status=
pub async fn list_withdrawals(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<WithdrawalFilter>,
) -> Result<Json<Vec<Withdrawal>>> {
    WithdrawalService::new(state.pool(), state.config().min_withdrawal)
        .list(filter.status)
        .await
        .map(Json)
}

/// Mark a withdrawal as paid out. The body is optional.
///
/// POST /api/admin/withdrawals/{id}/approve
pub async fn approve_withdrawal(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<WithdrawalId>,
    body: Option<Json<NoteRequest>>,
) -> Result<Json<Withdrawal>> {
    let note = body.map(|Json(body)| body).unwrap_or_default().note;
    WithdrawalService::new(state.pool(), state.config().min_withdrawal)
        .approve(id, admin.id, note.as_deref())
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct RejectWithdrawalRequest {
    pub note: String,
}

/// POST /api/admin/withdrawals/{id}/reject
pub async fn reject_withdrawal(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<WithdrawalId>,
    Json(body): Json<RejectWithdrawalRequest>,
) -> Result<Json<Withdrawal>> {
    WithdrawalService::new(state.pool(), state.config().min_withdrawal)
        .reject(id, admin.id, &body.note)
        .await
        .map(Json)
}

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<AdminStats>> {
    stats::for_admin(state.pool()).await.map(Json)
}
