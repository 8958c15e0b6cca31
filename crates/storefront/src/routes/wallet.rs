//! Customer wallet API.

use axum::extract::State;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::WalletRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{CustomerWallet, WalletTransaction};
use crate::routes::extract::{Json, Query};
use crate::services::DepositService;
use crate::services::deposits::{DepositCheckout, DepositOutcome};
use crate::state::AppState;

const TRANSACTION_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct VerifyDepositRequest {
    pub reference: String,
}

/// The wallet is created empty on first access.
///
/// GET /api/wallet
pub async fn get_wallet(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CustomerWallet>> {
    let wallet = WalletRepository::new(state.pool())
        .get_or_create(user.id)
        .await?;
    Ok(Json(wallet))
}

/// GET /api/wallet/transactions?limit=
pub async fn transactions(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<WalletTransaction>>> {
    let wallets = WalletRepository::new(state.pool());
    let wallet = wallets.get_or_create(user.id).await?;
    let limit = query
        .limit
        .unwrap_or(TRANSACTION_LIMIT)
        .clamp(1, TRANSACTION_LIMIT);
    Ok(Json(wallets.list_transactions(wallet.id, limit).await?))
}

/// Start a gateway checkout to top up the wallet.
///
/// POST /api/wallet/deposits
pub async fn deposit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<DepositRequest>,
) -> Result<Json<DepositCheckout>> {
    DepositService::new(state.pool(), state.paystack())
        .initialize(&user, body.amount)
        .await
        .map(Json)
}

/// Credit a successful deposit; repeating it is harmless.
///
/// POST /api/wallet/deposits/verify
pub async fn verify_deposit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<VerifyDepositRequest>,
) -> Result<Json<DepositOutcome>> {
    DepositService::new(state.pool(), state.paystack())
        .verify(body.reference.trim(), Some(user.id))
        .await
        .map(Json)
}
