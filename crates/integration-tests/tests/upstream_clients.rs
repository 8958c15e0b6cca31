//! Vendor and gateway clients against fake upstream servers.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use bundlehub_core::Network;
use bundlehub_integration_tests::{PAYSTACK_SECRET, spawn, test_config};
use bundlehub_storefront::paystack::{PaymentError, PaystackClient};
use bundlehub_storefront::vendor::{
    PurchaseRequest, RetryPolicy, VendorClient, VendorError, VendorOrderStatus,
};

const API_KEY: &str = "vk_test_integration_93ab71";

/// Requests the fake vendor received, plus scripted failures.
#[derive(Default)]
struct VendorLog {
    purchases: Vec<Value>,
    /// Status codes to answer before succeeding
    failures: Vec<StatusCode>,
}

type Shared = Arc<Mutex<VendorLog>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

async fn packages(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
    }
    (
        StatusCode::OK,
        Json(json!([
            {"code": "MTN-1GB", "network": "mtn", "name": "MTN 1GB", "data_volume_mb": 1024, "price": "4.50"},
            {"code": "TELECEL-2GB", "network": "telecel", "name": "Telecel 2GB", "data_volume_mb": 2048, "price": 8}
        ])),
    )
}

async fn purchase(State(log): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut log = log.lock().unwrap();
    log.purchases.push(body.clone());
    if !log.failures.is_empty() {
        let status = log.failures.remove(0);
        return (status, Json(json!({"error": "try again"})));
    }
    (
        StatusCode::OK,
        Json(json!({"status": "success", "vendor_reference": "V-991", "message": null})),
    )
}

async fn order_status(Path(reference): Path<String>) -> (StatusCode, Json<Value>) {
    if reference == "BH-PENDING0000000" {
        return (StatusCode::OK, Json(json!({"status": "pending"})));
    }
    (StatusCode::NOT_FOUND, Json(json!({"error": "unknown order"})))
}

async fn vendor(failures: Vec<StatusCode>) -> (VendorClient, Shared) {
    let log = Arc::new(Mutex::new(VendorLog {
        purchases: Vec::new(),
        failures,
    }));
    let router = Router::new()
        .route("/packages", get(packages))
        .route("/orders", post(purchase))
        .route("/orders/{reference}", get(order_status))
        .with_state(log.clone());
    let url = spawn(router).await;

    let config = test_config(&url, "http://127.0.0.1:1");
    let client = VendorClient::new(&config.vendor)
        .unwrap()
        .with_retry_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
        });
    (client, log)
}

fn request() -> PurchaseRequest<'static> {
    PurchaseRequest {
        reference: "BH-K3J9X2M4Q7A8B1C5",
        package_code: "MTN-1GB",
        network: Network::Mtn,
        recipient_phone: "0241234567",
    }
}

// =============================================================================
// Vendor
// =============================================================================

#[tokio::test]
async fn test_vendor_catalog() {
    let (client, _) = vendor(Vec::new()).await;
    let packages = client.packages().await.unwrap();
    assert_eq!(packages.len(), 2);
    assert_eq!(packages[0].price, Decimal::new(450, 2));
    assert_eq!(packages[1].network, Network::Telecel);

    let package = client.package("TELECEL-2GB").await.unwrap();
    assert_eq!(package.data_volume_mb, 2048);
    assert!(matches!(
        client.package("AT-5GB").await,
        Err(VendorError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_vendor_retries_transient_failures_with_same_reference() {
    let (client, log) = vendor(vec![
        StatusCode::SERVICE_UNAVAILABLE,
        StatusCode::TOO_MANY_REQUESTS,
    ])
    .await;

    let order = client.purchase(&request()).await.unwrap();
    assert_eq!(order.status, VendorOrderStatus::Success);
    assert_eq!(order.vendor_reference.as_deref(), Some("V-991"));

    let log = log.lock().unwrap();
    assert_eq!(log.purchases.len(), 3);
    assert!(
        log.purchases
            .iter()
            .all(|p| p["reference"] == "BH-K3J9X2M4Q7A8B1C5")
    );
}

#[tokio::test]
async fn test_vendor_gives_up_after_max_attempts() {
    let (client, log) = vendor(vec![StatusCode::BAD_GATEWAY; 5]).await;

    let err = client.purchase(&request()).await.unwrap_err();
    assert!(matches!(err, VendorError::Api { status: 502, .. }));
    assert!(err.is_transient());
    assert_eq!(log.lock().unwrap().purchases.len(), 3);
}

#[tokio::test]
async fn test_vendor_client_errors_are_not_retried() {
    let (client, log) = vendor(vec![StatusCode::UNPROCESSABLE_ENTITY]).await;

    let err = client.purchase(&request()).await.unwrap_err();
    assert!(matches!(err, VendorError::Api { status: 422, .. }));
    assert!(!err.is_transient());
    assert_eq!(log.lock().unwrap().purchases.len(), 1);
}

#[tokio::test]
async fn test_vendor_order_status() {
    let (client, _) = vendor(Vec::new()).await;

    let order = client.order_status("BH-PENDING0000000").await.unwrap();
    assert_eq!(order.status, VendorOrderStatus::Pending);
    assert!(order.vendor_reference.is_none());

    assert!(matches!(
        client.order_status("BH-UNKNOWN0000000").await,
        Err(VendorError::NotFound(_))
    ));
}

// =============================================================================
// Gateway
// =============================================================================

async fn initialize(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let expected = format!("Bearer {PAYSTACK_SECRET}");
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": false, "message": "Invalid key"})),
        );
    }
    // Echo the amount back so the test can see what was sent
    let reference = body["reference"].as_str().unwrap_or_default();
    let amount = body["amount"].as_i64().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "status": true,
            "message": "Authorization URL created",
            "data": {
                "authorization_url": format!("https://checkout.test/{reference}?amount={amount}"),
                "access_code": "ac_123",
                "reference": reference,
            }
        })),
    )
}

async fn verify(Path(reference): Path<String>) -> (StatusCode, Json<Value>) {
    if reference == "BH-MISSING00000000" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": false, "message": "Transaction reference not found"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "success",
                "amount": 1250,
                "currency": "GHS",
                "reference": reference,
                "customer": {"email": "ama@example.com"},
                "metadata": {"kind": "order"}
            }
        })),
    )
}

async fn gateway() -> PaystackClient {
    let router = Router::new()
        .route("/transaction/initialize", post(initialize))
        .route("/transaction/verify/{reference}", get(verify));
    let url = spawn(router).await;
    PaystackClient::new(&test_config("http://127.0.0.1:1", &url).paystack)
}

#[tokio::test]
async fn test_gateway_initialize_sends_minor_units() {
    let client = gateway().await;
    let checkout = client
        .initialize("ama@example.com", Decimal::new(1250, 2), "BH-REF", json!({}))
        .await
        .unwrap();
    assert_eq!(checkout.reference, "BH-REF");
    assert!(checkout.authorization_url.ends_with("amount=1250"));
}

#[tokio::test]
async fn test_gateway_refuses_unrepresentable_amounts() {
    let client = gateway().await;
    for amount in [Decimal::ZERO, Decimal::new(-100, 2), Decimal::new(1001, 3)] {
        assert!(matches!(
            client.initialize("ama@example.com", amount, "BH-REF", json!({})).await,
            Err(PaymentError::InvalidAmount(_))
        ));
    }
}

#[tokio::test]
async fn test_gateway_verify() {
    let client = gateway().await;
    let transaction = client.verify("BH-PAID000000000").await.unwrap();
    assert!(transaction.confirms(Decimal::new(1250, 2)));
    assert!(!transaction.confirms(Decimal::new(1300, 2)));
    assert_eq!(transaction.customer.email.as_deref(), Some("ama@example.com"));

    assert!(matches!(
        client.verify("BH-MISSING00000000").await,
        Err(PaymentError::Api { status: 400, .. })
    ));
}
