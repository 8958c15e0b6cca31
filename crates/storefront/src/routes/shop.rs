//! Public storefront API.
//!
//! Customers browse a store by slug and buy without an account, except
//! for wallet payments which need a login.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use bundlehub_core::{PaymentMethod, ProductId, Slug};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::OptionalUser;
use crate::models::{OrderTracking, PublicProduct, PublicStore};
use crate::routes::extract::{Json, Path};
use crate::services::OrderService;
use crate::services::orders::{Checkout, PlacedOrder, open_store};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StorePage {
    pub store: PublicStore,
    pub products: Vec<PublicProduct>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub product_id: ProductId,
    pub recipient_phone: String,
    pub payment_method: PaymentMethod,
    pub email: Option<String>,
}

/// A slug that fails validation cannot name a store.
fn store_slug(raw: &str) -> Result<Slug> {
    Slug::parse(raw).map_err(|_| AppError::NotFound("store".to_string()))
}

/// An approved store and its active products.
///
/// GET /api/shop/{slug}
pub async fn store(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<StorePage>> {
    let store = open_store(state.pool(), &store_slug(&slug)?).await?;
    let products = ProductRepository::new(state.pool())
        .list_active(store.id)
        .await?
        .into_iter()
        .map(PublicProduct::from)
        .collect();

    Ok(Json(StorePage {
        store: store.into(),
        products,
    }))
}

/// Wallet orders are paid and dispatched before this returns; gateway
/// orders come back `pending` with the checkout URL.
///
/// POST /api/shop/{slug}/orders
pub async fn place_order(
    State(state): State<AppState>,
    OptionalUser(customer): OptionalUser,
    Path(slug): Path<String>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let slug = store_slug(&slug)?;
    let placed = OrderService::new(state.pool(), state.vendor(), state.paystack())
        .place(
            &slug,
            Checkout {
                product_id: body.product_id,
                recipient_phone: &body.recipient_phone,
                payment_method: body.payment_method,
                email: body.email.as_deref(),
            },
            customer.as_ref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// Check a gateway payment after the customer returns from checkout.
///
/// POST /api/shop/orders/{reference}/verify
pub async fn verify_order(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<OrderTracking>> {
    OrderService::new(state.pool(), state.vendor(), state.paystack())
        .confirm_payment(&reference)
        .await
        .map(Json)
}

/// GET /api/shop/orders/{reference}
pub async fn track_order(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<OrderTracking>> {
    OrderService::new(state.pool(), state.vendor(), state.paystack())
        .track(&reference)
        .await
        .map(Json)
}
