//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                - Liveness
//! GET  /health/ready                          - Readiness (database)
//!
//! # Auth
//! POST /api/auth/register                     - Create account, log in
//! POST /api/auth/login                        - Password login
//! POST /api/auth/logout                       - End session
//! GET  /api/auth/me                           - Current user
//!
//! # Agent (role agent)
//! GET  /api/agent/store                       - Own store
//! POST /api/agent/store                       - Open a store
//! PATCH /api/agent/store                      - Edit store details
//! POST /api/agent/store/logo                  - Upload logo (data URL)
//! GET  /api/agent/bundles                     - Vendor catalog
//! GET  /api/agent/products                    - Store products
//! POST /api/agent/products                    - Add product
//! PATCH /api/agent/products/{id}              - Edit product
//! DELETE /api/agent/products/{id}             - Remove product
//! GET  /api/agent/orders?status=              - Store orders
//! PATCH /api/agent/orders/{id}/status         - Manual fulfillment
//! GET  /api/agent/withdrawals                 - Withdrawal history
//! POST /api/agent/withdrawals                 - Request withdrawal
//! GET  /api/agent/stats                       - Dashboard figures
//!
//! # Admin (role admin)
//! GET  /api/admin/stores?status=              - Stores
//! POST /api/admin/stores/{id}/approve         - Approve
//! POST /api/admin/stores/{id}/reject          - Reject with reason
//! POST /api/admin/stores/{id}/suspend         - Suspend
//! POST /api/admin/stores/{id}/reinstate       - Reinstate
//! POST /api/admin/stores/{id}/wallet          - Wallet adjustment
//! GET  /api/admin/stores/{id}/ledger          - Wallet ledger
//! GET  /api/admin/withdrawals?status=         - Withdrawals
//! POST /api/admin/withdrawals/{id}/approve    - Mark paid
//! POST /api/admin/withdrawals/{id}/reject     - Release funds
//! GET  /api/admin/stats                       - Platform figures
//!
//! # Customer wallet (any user)
//! GET  /api/wallet                            - Balance
//! GET  /api/wallet/transactions               - History
//! POST /api/wallet/deposits                   - Start top-up
//! POST /api/wallet/deposits/verify            - Credit top-up
//!
//! # Shop (public)
//! GET  /api/shop/{slug}                       - Store page
//! POST /api/shop/{slug}/orders                - Checkout
//! POST /api/shop/orders/{reference}/verify    - Confirm gateway payment
//! GET  /api/shop/orders/{reference}           - Track order
//!
//! # Webhooks
//! POST /api/webhooks/paystack                 - Gateway events
//! ```

pub mod admin;
pub mod agent;
pub mod auth;
pub mod extract;
pub mod shop;
pub mod wallet;
pub mod webhooks;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the agent routes router.
pub fn agent_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/store",
            get(agent::get_store)
                .post(agent::create_store)
                .patch(agent::update_store),
        )
        .route("/store/logo", post(agent::upload_logo))
        .route("/bundles", get(agent::bundles))
        .route(
            "/products",
            get(agent::list_products).post(agent::create_product),
        )
        .route(
            "/products/{id}",
            patch(agent::update_product).delete(agent::delete_product),
        )
        .route("/orders", get(agent::list_orders))
        .route("/orders/{id}/status", patch(agent::set_order_status))
        .route(
            "/withdrawals",
            get(agent::list_withdrawals).post(agent::request_withdrawal),
        )
        .route("/stats", get(agent::stats))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stores", get(admin::list_stores))
        .route("/stores/{id}/approve", post(admin::approve_store))
        .route("/stores/{id}/reject", post(admin::reject_store))
        .route("/stores/{id}/suspend", post(admin::suspend_store))
        .route("/stores/{id}/reinstate", post(admin::reinstate_store))
        .route("/stores/{id}/wallet", post(admin::adjust_wallet))
        .route("/stores/{id}/ledger", get(admin::ledger))
        .route("/withdrawals", get(admin::list_withdrawals))
        .route("/withdrawals/{id}/approve", post(admin::approve_withdrawal))
        .route("/withdrawals/{id}/reject", post(admin::reject_withdrawal))
        .route("/stats", get(admin::stats))
}

/// Create the customer wallet routes router.
pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wallet::get_wallet))
        .route("/transactions", get(wallet::transactions))
        .route("/deposits", post(wallet::deposit))
        .route("/deposits/verify", post(wallet::verify_deposit))
}

/// Create the public shop routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/{reference}", get(shop::track_order))
        .route("/orders/{reference}/verify", post(shop::verify_order))
        .route("/{slug}", get(shop::store))
        .route("/{slug}/orders", post(shop::place_order))
}

/// Create the webhook routes router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/paystack", post(webhooks::paystack))
}

/// Create the health check routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Create all API routes.
///
/// `/api/auth` and `/api/shop` are returned separately by [`auth_routes`]
/// and [`shop_routes`] so the binary can put rate limiters on them.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .nest("/api/agent", agent_routes())
        .nest("/api/admin", admin_routes())
        .nest("/api/wallet", wallet_routes())
        .nest("/api/webhooks", webhook_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
