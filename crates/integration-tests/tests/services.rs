//! Money paths through the services, against a real database.
//!
//! The vendor and the payment gateway are fake servers in this process; the
//! gateway reports every initialized checkout as paid in full.
//!
//! These tests require a `PostgreSQL` database; migrations are applied on
//! connect. Run with:
//! `BUNDLEHUB_TEST_DATABASE_URL=... cargo test -p bundlehub-integration-tests --test services -- --ignored`

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use uuid::Uuid;

use bundlehub_core::{
    LedgerKind, Network, OrderStatus, PaymentMethod, PaymentStatus, StoreStatus, StoreWallet,
    UserRole, WalletTxKind, WithdrawalStatus,
};
use bundlehub_integration_tests::{database, sign_webhook, spawn, test_config};
use bundlehub_storefront::db::{LedgerRepository, OrderRepository, WalletRepository};
use bundlehub_storefront::error::AppError;
use bundlehub_storefront::middleware::session_layer;
use bundlehub_storefront::models::{CurrentUser, Order, Product, Store, User};
use bundlehub_storefront::paystack::PaystackClient;
use bundlehub_storefront::services::auth::Registration;
use bundlehub_storefront::services::orders::{Checkout, PlacedOrder};
use bundlehub_storefront::services::products::ProductForm;
use bundlehub_storefront::services::store_wallet::{self, Movement};
use bundlehub_storefront::services::stores::{StoreEdit, StoreForm};
use bundlehub_storefront::services::withdrawals::WithdrawalRequest;
use bundlehub_storefront::services::{
    AuthService, DepositService, OrderService, ProductService, StoreService, WithdrawalService,
};
use bundlehub_storefront::state::AppState;
use bundlehub_storefront::vendor::VendorClient;

/// Package the fake vendor can never deliver.
const UNDELIVERABLE: &str = "MTN-FAIL";

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

// =============================================================================
// Fake upstreams
// =============================================================================

async fn packages() -> Json<Value> {
    Json(json!([
        {"code": "MTN-1GB", "network": "mtn", "name": "MTN 1GB", "data_volume_mb": 1024, "price": "4.50"},
        {"code": UNDELIVERABLE, "network": "mtn", "name": "MTN 2GB", "data_volume_mb": 2048, "price": "4.50"}
    ]))
}

async fn purchase(Json(body): Json<Value>) -> Json<Value> {
    if body["package_code"] == UNDELIVERABLE {
        return Json(json!({"status": "failed", "message": "recipient not eligible"}));
    }
    let reference = body["reference"].as_str().unwrap_or_default();
    Json(json!({"status": "success", "vendor_reference": format!("V-{reference}")}))
}

async fn vendor_order(Path(_reference): Path<String>) -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"error": "unknown order"})))
}

/// Checkouts the fake gateway handed out, by reference.
type Charges = Arc<Mutex<HashMap<String, Value>>>;

async fn initialize(State(charges): State<Charges>, Json(body): Json<Value>) -> Json<Value> {
    let reference = body["reference"].as_str().unwrap_or_default().to_string();
    charges.lock().unwrap().insert(reference.clone(), body.clone());
    Json(json!({
        "status": true,
        "message": "Authorization URL created",
        "data": {
            "authorization_url": format!("https://checkout.test/{reference}"),
            "access_code": "ac_test",
            "reference": reference,
        }
    }))
}

async fn verify(
    State(charges): State<Charges>,
    Path(reference): Path<String>,
) -> (StatusCode, Json<Value>) {
    let Some(charge) = charges.lock().unwrap().get(&reference).cloned() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": false, "message": "Transaction reference not found"})),
        );
    };
    (
        StatusCode::OK,
        Json(json!({
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "success",
                "amount": charge["amount"],
                "currency": "GHS",
                "reference": reference,
                "customer": {"email": charge["email"]},
                "metadata": charge["metadata"],
            }
        })),
    )
}

struct Harness {
    pool: PgPool,
    vendor: VendorClient,
    paystack: PaystackClient,
    vendor_url: String,
    paystack_url: String,
}

impl Harness {
    async fn new() -> Self {
        let vendor_url = spawn(
            Router::new()
                .route("/packages", get(packages))
                .route("/orders", post(purchase))
                .route("/orders/{reference}", get(vendor_order)),
        )
        .await;
        let paystack_url = spawn(
            Router::new()
                .route("/transaction/initialize", post(initialize))
                .route("/transaction/verify/{reference}", get(verify))
                .with_state(Charges::default()),
        )
        .await;

        let config = test_config(&vendor_url, &paystack_url);
        Self {
            pool: database().await,
            vendor: VendorClient::new(&config.vendor).unwrap(),
            paystack: PaystackClient::new(&config.paystack),
            vendor_url,
            paystack_url,
        }
    }

    fn orders(&self) -> OrderService<'_> {
        OrderService::new(&self.pool, &self.vendor, &self.paystack)
    }

    fn deposits(&self) -> DepositService<'_> {
        DepositService::new(&self.pool, &self.paystack)
    }

    fn withdrawals(&self) -> WithdrawalService<'_> {
        WithdrawalService::new(&self.pool, Decimal::TEN)
    }

    async fn user(&self, role: UserRole) -> User {
        let email = format!("{role}-{}@example.com", Uuid::new_v4().simple());
        AuthService::new(&self.pool)
            .register(Registration {
                email: &email,
                password: "integration-password",
                full_name: "Service Test",
                phone: "0241234567",
                role,
            })
            .await
            .unwrap()
    }

    async fn admin(&self) -> User {
        let email = format!("admin-{}@example.com", Uuid::new_v4().simple());
        AuthService::new(&self.pool)
            .create_admin(&email, "Service Admin", "integration-password")
            .await
            .unwrap()
    }

    /// An agent with a store awaiting review.
    async fn store(&self) -> (User, Store) {
        let agent = self.user(UserRole::Agent).await;
        let slug = format!("shop-{}", &Uuid::new_v4().simple().to_string()[..8]);
        let store = StoreService::new(&self.pool)
            .create(
                agent.id,
                StoreForm {
                    name: "Service Data",
                    slug: &slug,
                    description: None,
                    contact_phone: "0201234567",
                },
            )
            .await
            .unwrap();
        (agent, store)
    }

    /// An approved store selling `package_code` at 6.00.
    async fn shop(&self, package_code: &str) -> (User, Store, Product) {
        let (agent, store) = self.store().await;
        let store = StoreService::new(&self.pool)
            .set_status(store.id, StoreStatus::Approved, None)
            .await
            .unwrap();
        let product = ProductService::new(&self.pool, &self.vendor)
            .create(
                agent.id,
                ProductForm {
                    package_code,
                    price: d("6.00"),
                    name: None,
                    is_active: true,
                },
            )
            .await
            .unwrap();
        (agent, store, product)
    }

    /// A customer whose wallet holds `amount`, funded through the gateway.
    async fn funded_customer(&self, amount: Decimal) -> CurrentUser {
        let customer = CurrentUser::from(&self.user(UserRole::Customer).await);
        let checkout = self.deposits().initialize(&customer, amount).await.unwrap();
        let outcome = self
            .deposits()
            .verify(&checkout.reference, Some(customer.id))
            .await
            .unwrap();
        assert!(outcome.credited);
        customer
    }

    async fn buy(
        &self,
        store: &Store,
        product: &Product,
        method: PaymentMethod,
        customer: Option<&CurrentUser>,
    ) -> Result<PlacedOrder, AppError> {
        self.orders()
            .place(
                &store.slug,
                Checkout {
                    product_id: product.id,
                    recipient_phone: "0551234567",
                    payment_method: method,
                    email: customer.is_none().then_some("guest@example.com"),
                },
                customer,
            )
            .await
    }

    async fn order(&self, reference: &str) -> Order {
        OrderRepository::new(&self.pool)
            .get_by_reference(reference)
            .await
            .unwrap()
            .unwrap()
    }

    async fn balance(&self, customer: &CurrentUser) -> Decimal {
        WalletRepository::new(&self.pool)
            .get_or_create(customer.id)
            .await
            .unwrap()
            .balance
    }

    async fn wallet(&self, owner: &User) -> StoreWallet {
        StoreService::new(&self.pool)
            .for_owner(owner.id)
            .await
            .unwrap()
            .wallet
    }
}

// =============================================================================
// Deposits
// =============================================================================

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_deposit_is_credited_once_across_webhook_and_verify() {
    let h = Harness::new().await;
    let customer = CurrentUser::from(&h.user(UserRole::Customer).await);
    let checkout = h.deposits().initialize(&customer, d("25.00")).await.unwrap();

    // The webhook lands first
    let state = AppState::new(test_config(&h.vendor_url, &h.paystack_url), h.pool.clone()).unwrap();
    let app = bundlehub_storefront::app(state, session_layer(MemoryStore::default(), false), false);
    let body = json!({"event": "charge.success", "data": {"reference": checkout.reference}})
        .to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/paystack")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-paystack-signature", sign_webhook(body.as_bytes()))
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.balance(&customer).await, d("25.00"));

    // Then the customer's browser returns and verifies
    let outcome = h
        .deposits()
        .verify(&checkout.reference, Some(customer.id))
        .await
        .unwrap();
    assert!(!outcome.credited);
    assert_eq!(outcome.wallet.balance, d("25.00"));

    let wallet = WalletRepository::new(&h.pool)
        .get_or_create(customer.id)
        .await
        .unwrap();
    let transactions = WalletRepository::new(&h.pool)
        .list_transactions(wallet.id, 10)
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].kind, WalletTxKind::Deposit);
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_deposit_of_another_account_is_refused() {
    let h = Harness::new().await;
    let owner = CurrentUser::from(&h.user(UserRole::Customer).await);
    let other = h.user(UserRole::Customer).await;
    let checkout = h.deposits().initialize(&owner, d("5.00")).await.unwrap();

    let err = h
        .deposits()
        .verify(&checkout.reference, Some(other.id))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
    assert_eq!(h.balance(&owner).await, Decimal::ZERO);
}

// =============================================================================
// Wallet orders
// =============================================================================

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_wallet_order_credits_store_profit_once() {
    let h = Harness::new().await;
    let (agent, store, product) = h.shop("MTN-1GB").await;
    let customer = h.funded_customer(d("10.00")).await;

    let placed = h
        .buy(&store, &product, PaymentMethod::Wallet, Some(&customer))
        .await
        .unwrap();
    assert_eq!(placed.order.order_status, OrderStatus::Completed);
    assert_eq!(placed.order.payment_status, PaymentStatus::Paid);
    assert!(placed.authorization_url.is_none());
    assert_eq!(h.balance(&customer).await, d("4.00"));

    let wallet = h.wallet(&agent).await;
    assert_eq!(wallet.available, d("1.50"));
    assert_eq!(wallet.earned, d("1.50"));

    // A repeated completion is refused by the order state
    let order = h.order(&placed.order.reference).await;
    let err = h
        .orders()
        .set_status(agent.id, order.id, OrderStatus::Completed, None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::CONFLICT);

    // and a second sale credit by the ledger's unique reference
    let mut tx = h.pool.begin().await.unwrap();
    let err = store_wallet::apply(
        &mut tx,
        store.id,
        Movement {
            kind: LedgerKind::SaleProfit,
            amount: order.profit,
            reference: Some(&order.reference),
            note: None,
            created_by: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    drop(tx);

    assert_eq!(h.wallet(&agent).await.earned, d("1.50"));
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_failed_delivery_refunds_wallet_and_credits_nothing() {
    let h = Harness::new().await;
    let (agent, store, product) = h.shop(UNDELIVERABLE).await;
    let customer = h.funded_customer(d("10.00")).await;

    let placed = h
        .buy(&store, &product, PaymentMethod::Wallet, Some(&customer))
        .await
        .unwrap();
    assert_eq!(placed.order.order_status, OrderStatus::Failed);
    assert_eq!(placed.order.payment_status, PaymentStatus::Refunded);
    assert!(
        placed
            .order
            .failure_reason
            .as_deref()
            .is_some_and(|r| r.contains("not eligible"))
    );

    assert_eq!(h.balance(&customer).await, d("10.00"));
    assert_eq!(h.wallet(&agent).await, StoreWallet::default());
    let ledger = LedgerRepository::new(&h.pool)
        .list_for_store(store.id, 10)
        .await
        .unwrap();
    assert!(ledger.is_empty());
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_wallet_order_needs_enough_balance() {
    let h = Harness::new().await;
    let (_, store, product) = h.shop("MTN-1GB").await;
    let customer = h.funded_customer(d("5.99")).await;

    let err = h
        .buy(&store, &product, PaymentMethod::Wallet, Some(&customer))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds(_)));
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(h.balance(&customer).await, d("5.99"));
    let orders = OrderRepository::new(&h.pool)
        .list_for_store(store.id, None, 10)
        .await
        .unwrap();
    assert!(orders.is_empty());
}

// =============================================================================
// Gateway orders
// =============================================================================

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_gateway_order_is_fulfilled_after_payment() {
    let h = Harness::new().await;
    let (agent, store, product) = h.shop("MTN-1GB").await;

    let placed = h
        .buy(&store, &product, PaymentMethod::Paystack, None)
        .await
        .unwrap();
    assert_eq!(placed.order.payment_status, PaymentStatus::Pending);
    assert!(placed.authorization_url.is_some());

    let tracking = h.orders().confirm_payment(&placed.order.reference).await.unwrap();
    assert_eq!(tracking.order_status, OrderStatus::Completed);

    // Verify again, as the webhook would
    let again = h.orders().confirm_payment(&placed.order.reference).await.unwrap();
    assert_eq!(again.order_status, OrderStatus::Completed);
    assert_eq!(h.wallet(&agent).await.earned, d("1.50"));
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_payment_after_cancellation_is_refunded_to_wallet() {
    let h = Harness::new().await;
    let (agent, store, product) = h.shop("MTN-1GB").await;
    let customer = CurrentUser::from(&h.user(UserRole::Customer).await);

    let placed = h
        .buy(&store, &product, PaymentMethod::Paystack, Some(&customer))
        .await
        .unwrap();
    let order = h.order(&placed.order.reference).await;
    let cancelled = h
        .orders()
        .set_status(agent.id, order.id, OrderStatus::Cancelled, Some("out of stock"))
        .await
        .unwrap();
    assert_eq!(cancelled.payment_status, PaymentStatus::Pending);

    // The customer finishes the checkout anyway
    let tracking = h.orders().confirm_payment(&order.reference).await.unwrap();
    assert_eq!(tracking.order_status, OrderStatus::Cancelled);
    assert_eq!(tracking.payment_status, PaymentStatus::Refunded);
    assert_eq!(h.balance(&customer).await, d("6.00"));

    // Nothing more happens on a second confirmation
    let again = h.orders().confirm_payment(&order.reference).await.unwrap();
    assert_eq!(again.payment_status, PaymentStatus::Refunded);
    assert_eq!(h.balance(&customer).await, d("6.00"));
    assert_eq!(h.wallet(&agent).await, StoreWallet::default());
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_guest_payment_after_cancellation_stays_paid() {
    let h = Harness::new().await;
    let (agent, store, product) = h.shop("MTN-1GB").await;

    let placed = h
        .buy(&store, &product, PaymentMethod::Paystack, None)
        .await
        .unwrap();
    let order = h.order(&placed.order.reference).await;
    h.orders()
        .set_status(agent.id, order.id, OrderStatus::Cancelled, None)
        .await
        .unwrap();

    let tracking = h.orders().confirm_payment(&order.reference).await.unwrap();
    assert_eq!(tracking.order_status, OrderStatus::Cancelled);
    assert_eq!(tracking.payment_status, PaymentStatus::Paid);
    assert_eq!(
        tracking.failure_reason.as_deref(),
        Some("paid after cancellation")
    );
    assert_eq!(h.wallet(&agent).await, StoreWallet::default());
}

// =============================================================================
// Stores and withdrawals
// =============================================================================

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_rejected_store_returns_to_review_after_edit() {
    let h = Harness::new().await;
    let (agent, store) = h.store().await;
    let stores = StoreService::new(&h.pool);

    let rejected = stores
        .set_status(store.id, StoreStatus::Rejected, Some("logo is unreadable"))
        .await
        .unwrap();
    assert_eq!(rejected.rejection_reason.as_deref(), Some("logo is unreadable"));

    let edited = stores
        .update(
            agent.id,
            StoreEdit {
                name: Some("Service Data Plus"),
                ..StoreEdit::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.status, StoreStatus::PendingApproval);
    assert!(edited.rejection_reason.is_none());
    assert_eq!(edited.name, "Service Data Plus");
}

#[tokio::test]
#[ignore = "Requires migrated database"]
async fn test_one_pending_withdrawal_and_ledger_replays() {
    let h = Harness::new().await;
    let admin = h.admin().await;
    let (agent, store, _) = h.shop("MTN-1GB").await;
    store_wallet::adjust(&h.pool, store.id, d("50.00"), "opening balance", admin.id)
        .await
        .unwrap();

    let request = || WithdrawalRequest {
        amount: d("20.00"),
        network: Network::Mtn,
        account_number: "0241234567",
        account_name: "Kofi Agent",
    };
    let first = h.withdrawals().request(agent.id, request()).await.unwrap();
    let err = h.withdrawals().request(agent.id, request()).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::CONFLICT);

    let rejected = h
        .withdrawals()
        .reject(first.id, admin.id, "wrong account name")
        .await
        .unwrap();
    assert_eq!(rejected.status, WithdrawalStatus::Rejected);
    assert_eq!(h.wallet(&agent).await.available, d("50.00"));

    let second = h.withdrawals().request(agent.id, request()).await.unwrap();
    h.withdrawals().approve(second.id, admin.id, None).await.unwrap();
    let wallet = h.wallet(&agent).await;
    assert_eq!(wallet.available, d("30.00"));
    assert_eq!(wallet.pending, Decimal::ZERO);
    assert_eq!(wallet.withdrawn, d("20.00"));

    // Every row holds the balances a replay of the rows before it produces
    let mut entries = LedgerRepository::new(&h.pool)
        .list_for_store(store.id, 100)
        .await
        .unwrap();
    entries.reverse();
    assert_eq!(entries.len(), 5);

    let mut replayed = StoreWallet::default();
    for entry in &entries {
        replayed = replayed.apply(entry.kind, entry.amount).unwrap();
        assert_eq!(entry.available_after, replayed.available, "{}", entry.kind);
        assert_eq!(entry.pending_after, replayed.pending, "{}", entry.kind);
        assert_eq!(entry.earned_after, replayed.earned, "{}", entry.kind);
        assert_eq!(entry.withdrawn_after, replayed.withdrawn, "{}", entry.kind);
    }
    assert_eq!(replayed, wallet);
}
