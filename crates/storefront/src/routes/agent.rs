//! Agent dashboard API.
//!
//! Every handler requires a logged-in agent and works on the agent's own
//! store; one agent owns at most one store.

use axum::{extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bundlehub_core::{Network, OrderId, OrderStatus, ProductId};

use crate::db::products::DeleteOutcome;
use crate::error::Result;
use crate::middleware::RequireAgent;
use crate::routes::extract::{Json, Path, Query};
use crate::models::{Order, Product, Store, Withdrawal};
use crate::services::products::{ProductEdit, ProductForm};
use crate::services::stats::{self, AgentStats};
use crate::services::stores::{StoreEdit, StoreForm};
use crate::services::withdrawals::WithdrawalRequest;
use crate::services::{OrderService, ProductService, StoreService, WithdrawalService};
use crate::state::AppState;
use crate::vendor::Package;

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub contact_phone: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogoRequest {
    pub data_url: String,
}

/// GET /api/agent/store
pub async fn get_store(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
) -> Result<Json<Store>> {
    StoreService::new(state.pool())
        .for_owner(agent.id)
        .await
        .map(Json)
}

/// Open a store; it waits in `pending_approval` until an admin decides.
///
/// POST /api/agent/store
pub async fn create_store(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Json(body): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<Store>)> {
    let store = StoreService::new(state.pool())
        .create(
            agent.id,
            StoreForm {
                name: &body.name,
                slug: &body.slug,
                description: body.description.as_deref(),
                contact_phone: &body.contact_phone,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(store)))
}

/// PATCH /api/agent/store
pub async fn update_store(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Json(body): Json<UpdateStoreRequest>,
) -> Result<Json<Store>> {
    StoreService::new(state.pool())
        .update(
            agent.id,
            StoreEdit {
                name: body.name.as_deref(),
                description: body.description.as_deref(),
                contact_phone: body.contact_phone.as_deref(),
            },
        )
        .await
        .map(Json)
}

/// POST /api/agent/store/logo
pub async fn upload_logo(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Json(body): Json<LogoRequest>,
) -> Result<Json<Store>> {
    StoreService::new(state.pool())
        .set_logo(agent.id, &body.data_url)
        .await
        .map(Json)
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub package_code: String,
    pub price: Decimal,
    pub name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub outcome: DeleteOutcome,
}

/// Vendor packages the agent can resell.
///
/// GET /api/agent/bundles
pub async fn bundles(
    State(state): State<AppState>,
    RequireAgent(_agent): RequireAgent,
) -> Result<Json<Vec<Package>>> {
    ProductService::new(state.pool(), state.vendor())
        .catalog()
        .await
        .map(Json)
}

/// GET /api/agent/products
pub async fn list_products(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
) -> Result<Json<Vec<Product>>> {
    ProductService::new(state.pool(), state.vendor())
        .list(agent.id)
        .await
        .map(Json)
}

/// POST /api/agent/products
pub async fn create_product(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductService::new(state.pool(), state.vendor())
        .create(
            agent.id,
            ProductForm {
                package_code: &body.package_code,
                price: body.price,
                name: body.name.as_deref(),
                is_active: body.is_active,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /api/agent/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    ProductService::new(state.pool(), state.vendor())
        .update(
            agent.id,
            id,
            ProductEdit {
                name: body.name.as_deref(),
                price: body.price,
                is_active: body.is_active,
            },
        )
        .await
        .map(Json)
}

/// Products with order history are deactivated instead of removed.
///
/// DELETE /api/agent/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Path(id): Path<ProductId>,
) -> Result<Json<DeleteResponse>> {
    let outcome = ProductService::new(state.pool(), state.vendor())
        .delete(agent.id, id)
        .await?;
    Ok(Json(DeleteResponse { outcome }))
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub order_status: OrderStatus,
    pub failure_reason: Option<String>,
}

/// GET /api/agent/orders?status=
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<Order>>> {
    OrderService::new(state.pool(), state.vendor(), state.paystack())
        .list_for_agent(agent.id, filter.status)
        .await
        .map(Json)
}

/// Manual fulfillment.
///
/// PATCH /api/agent/orders/{id}/status
pub async fn set_order_status(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Path(id): Path<OrderId>,
    Json(body): Json<OrderStatusRequest>,
) -> Result<Json<Order>> {
    OrderService::new(state.pool(), state.vendor(), state.paystack())
        .set_status(agent.id, id, body.order_status, body.failure_reason.as_deref())
        .await
        .map(Json)
}

// =============================================================================
// Withdrawals and stats
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateWithdrawalRequest {
    pub amount: Decimal,
    pub network: Network,
    pub account_number: String,
    pub account_name: String,
}

/// GET /api/agent/withdrawals
pub async fn list_withdrawals(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
) -> Result<Json<Vec<Withdrawal>>> {
    WithdrawalService::new(state.pool(), state.config().min_withdrawal)
        .list_for_agent(agent.id)
        .await
        .map(Json)
}

/// Hold `amount` from the store wallet until an admin decides.
///
/// POST /api/agent/withdrawals
pub async fn request_withdrawal(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
    Json(body): Json<CreateWithdrawalRequest>,
) -> Result<(StatusCode, Json<Withdrawal>)> {
    let withdrawal = WithdrawalService::new(state.pool(), state.config().min_withdrawal)
        .request(
            agent.id,
            WithdrawalRequest {
                amount: body.amount,
                network: body.network,
                account_number: &body.account_number,
                account_name: &body.account_name,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(withdrawal)))
}

/// GET /api/agent/stats
pub async fn stats(
    State(state): State<AppState>,
    RequireAgent(agent): RequireAgent,
) -> Result<Json<AgentStats>> {
    stats::for_agent(state.pool(), agent.id).await.map(Json)
}
