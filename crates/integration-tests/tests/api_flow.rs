//! End-to-end tests against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`bh-cli migrate`)
//! - The storefront running (`cargo run -p bundlehub-storefront`)
//!
//! Run with: `cargo test -p bundlehub-integration-tests -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
fn base_url() -> String {
    std::env::var("BUNDLEHUB_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps the session cookie.
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// Register and stay logged in.
async fn register(client: &Client, role: &str) -> Value {
    let response = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "email": unique_email(role),
            "password": "integration-password",
            "full_name": "Integration Test",
            "phone": "0241234567",
            "role": role,
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to read user")
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_session_lifecycle() {
    let client = client();
    let user = register(&client, "customer").await;

    let me: Value = client
        .get(format!("{}/api/auth/me", base_url()))
        .send()
        .await
        .expect("Failed to get me")
        .json()
        .await
        .expect("Failed to read me");
    assert_eq!(me["id"], user["id"]);
    assert_eq!(me["role"], "customer");
    assert!(me.get("password_hash").is_none());

    let response = client
        .post(format!("{}/api/auth/logout", base_url()))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/api/auth/me", base_url()))
        .send()
        .await
        .expect("Failed to get me");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_customer_wallet_starts_empty() {
    let client = client();
    register(&client, "customer").await;

    let wallet: Value = client
        .get(format!("{}/api/wallet", base_url()))
        .send()
        .await
        .expect("Failed to get wallet")
        .json()
        .await
        .expect("Failed to read wallet");
    assert_eq!(wallet["balance"], "0.00");

    let transactions: Value = client
        .get(format!("{}/api/wallet/transactions", base_url()))
        .send()
        .await
        .expect("Failed to list transactions")
        .json()
        .await
        .expect("Failed to read transactions");
    assert_eq!(transactions, json!([]));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_customer_cannot_use_agent_api() {
    let client = client();
    register(&client, "customer").await;

    let response = client
        .get(format!("{}/api/agent/store", base_url()))
        .send()
        .await
        .expect("Failed to call agent API");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_new_store_is_hidden_until_approved() {
    let client = client();
    register(&client, "agent").await;
    let slug = format!("shop-{}", &Uuid::new_v4().simple().to_string()[..8]);

    let response = client
        .post(format!("{}/api/agent/store", base_url()))
        .json(&json!({
            "name": "Integration Data",
            "slug": slug,
            "contact_phone": "0201234567",
        }))
        .send()
        .await
        .expect("Failed to create store");
    assert_eq!(response.status(), StatusCode::CREATED);
    let store: Value = response.json().await.expect("Failed to read store");
    assert_eq!(store["status"], "pending_approval");
    assert_eq!(store["wallet"]["available"], "0.00");

    // Unapproved stores cannot list products
    let response = client
        .post(format!("{}/api/agent/products", base_url()))
        .json(&json!({"package_code": "MTN-1GB", "price": "6.00"}))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .get(format!("{}/api/shop/{slug}", base_url()))
        .send()
        .await
        .expect("Failed to fetch shop");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
