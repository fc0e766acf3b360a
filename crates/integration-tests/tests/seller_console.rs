//! Seller console against a live seller API.
//!
//! The storefront signs in through the memory backend and calls the seller
//! API over HTTP with the resulting bearer token.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;

use artisan_backend::memory::{MemoryAuth, MemoryBackend};
use artisan_core::models::PRODUCTS_COLLECTION;
use artisan_core::{Credentials, ProductId};
use artisan_integration_tests::{TestServer, add_user, fields, storefront, unreachable_pool};
use artisan_storefront::profile::{BuyerProfileForm, FormStatus, SAVE_FAILED};
use artisan_storefront::seller::{Inventory, load_dashboard};
use artisan_storefront::{AppError, Decision};

fn seed(memory: &MemoryBackend) {
    let ravi = add_user(memory, "ravi@example.com", "secret1", "seller");
    let meera = add_user(memory, "meera@example.com", "secret1", "seller");
    memory.store.insert(
        PRODUCTS_COLLECTION,
        "vase",
        fields(json!({
            "name": "Blue Vase", "category": "pottery", "price": 450,
            "quantity": 3, "sold": 2, "sellerId": ravi.as_str(),
        })),
    );
    memory.store.insert(
        PRODUCTS_COLLECTION,
        "bowl",
        fields(json!({
            "name": "Tea Bowl", "category": "pottery", "price": 300,
            "quantity": 5, "sold": 1, "sellerId": ravi.as_str(),
        })),
    );
    memory.store.insert(
        PRODUCTS_COLLECTION,
        "shawl",
        fields(json!({
            "name": "Pashmina Shawl", "category": "textiles", "price": 1200,
            "quantity": 1, "sellerId": meera.as_str(),
        })),
    );
    memory.store.insert(
        "orders",
        "o1",
        fields(json!({
            "sellerId": ravi.as_str(), "productName": "Blue Vase",
            "amount": 450, "status": "pending",
            "createdAt": "2025-03-01T10:00:00Z",
        })),
    );
    memory.store.insert(
        "orders",
        "o2",
        fields(json!({
            "sellerId": meera.as_str(), "productName": "Pashmina Shawl",
            "amount": 1200, "status": "pending",
        })),
    );
}

async fn login(app: &artisan_storefront::App, email: &str) {
    app.session().resolved().await;
    app.session()
        .login(&Credentials::new(email, "secret1").unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_health_over_http() {
    let memory = MemoryBackend::new();
    let server = TestServer::spawn(&memory, unreachable_pool(), false).await;

    let resp = reqwest::get(server.url.join("health").unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let resp = reqwest::get(server.url.join("health/ready").unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_dashboard_is_scoped_to_signed_in_seller() {
    let memory = MemoryBackend::new();
    seed(&memory);
    let server = TestServer::spawn(&memory, unreachable_pool(), true).await;
    let app = storefront(&memory, &server.url);
    login(&app, "ravi@example.com").await;

    assert_eq!(app.open("/seller/dashboard").decision, Decision::Render);

    let dashboard = load_dashboard(app.api(), &app.session().current_session())
        .await
        .unwrap();

    assert_eq!(dashboard.greeting, "Welcome back, ravi@example.com");
    assert_eq!(dashboard.total_products, Some(2));
    assert_eq!(dashboard.pending_orders, Some(1));
    assert_eq!(dashboard.monthly_revenue.display(), "₹1,200.00");
    assert_eq!(dashboard.recent_sales.len(), 1);
    assert!(dashboard.problems.is_empty());

    app.shutdown();
}

#[tokio::test]
async fn test_inventory_delete_removes_document() {
    let memory = MemoryBackend::new();
    seed(&memory);
    let server = TestServer::spawn(&memory, unreachable_pool(), true).await;
    let app = storefront(&memory, &server.url);
    login(&app, "ravi@example.com").await;

    let mut inventory = Inventory::load(app.api()).await.unwrap();
    assert_eq!(inventory.items().len(), 2);

    inventory
        .delete(app.api(), &ProductId::new("vase"))
        .await
        .unwrap();

    assert_eq!(inventory.items().len(), 1);
    let remaining: Vec<String> = memory
        .store
        .documents(PRODUCTS_COLLECTION)
        .iter()
        .map(|doc| doc.id.clone())
        .collect();
    assert_eq!(remaining, vec!["bowl".to_string(), "shawl".to_string()]);

    app.shutdown();
}

#[tokio::test]
async fn test_cannot_delete_another_sellers_item() {
    let memory = MemoryBackend::new();
    seed(&memory);
    let server = TestServer::spawn(&memory, unreachable_pool(), true).await;
    let app = storefront(&memory, &server.url);
    login(&app, "ravi@example.com").await;

    let err = app
        .api()
        .delete_seller_item(&ProductId::new("shawl"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        artisan_storefront::api::ApiError::Status { status: 403, .. }
    ));
    assert_eq!(memory.store.documents(PRODUCTS_COLLECTION).len(), 3);

    app.shutdown();
}

#[tokio::test]
async fn test_anonymous_requests_rejected_when_auth_required() {
    let memory = MemoryBackend::new();
    seed(&memory);
    let server = TestServer::spawn(&memory, unreachable_pool(), true).await;

    let resp = reqwest::get(server.url.join("api/seller/items").unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let uid = memory.auth.add_account("nobody@example.com", "secret1").unwrap();
    let resp = reqwest::Client::new()
        .get(server.url.join("api/seller/items").unwrap())
        .bearer_auth(MemoryAuth::token_for(&uid))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let items: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_dashboard_without_session_is_refused() {
    let memory = MemoryBackend::new();
    seed(&memory);
    let server = TestServer::spawn(&memory, unreachable_pool(), true).await;
    let app = storefront(&memory, &server.url);
    app.session().resolved().await;

    let err = load_dashboard(app.api(), &app.session().current_session())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotSignedIn));

    app.shutdown();
}

#[tokio::test]
async fn test_profile_save_reports_failure_when_database_is_down() {
    let memory = MemoryBackend::new();
    let server = TestServer::spawn(&memory, unreachable_pool(), false).await;
    let app = storefront(&memory, &server.url);

    let mut form = BuyerProfileForm::default();
    form.profile.first_name = "Asha".to_string();
    form.profile.email = "asha@example.com".to_string();
    form.profile.address = "12 MG Road".to_string();
    form.profile.city = "Jaipur".to_string();
    form.profile.postal_code = "302001".to_string();

    let status = form.submit(app.api()).await;

    assert_eq!(status, &FormStatus::Failed(SAVE_FAILED.to_string()));
    assert_eq!(form.profile.first_name, "Asha");

    app.shutdown();
}
