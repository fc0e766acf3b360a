//! Profile saves against a real database.
//!
//! These tests require a `PostgreSQL` database named by `DATABASE_URL`.
//! Run with: `cargo test -p artisan-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use sqlx::PgPool;

use artisan_backend::memory::MemoryBackend;
use artisan_core::models::{BuyerProfile, SellerProfile};
use artisan_integration_tests::{TestServer, storefront};
use artisan_seller_api::db::{self, profiles::ProfileRepository};
use artisan_storefront::profile::{BuyerProfileForm, FormStatus, SellerProfileForm};

async fn migrated_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::create_pool(&SecretString::from(url)).await.unwrap();
    db::migrate(&pool).await.unwrap();
    pool
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", unique_suffix())
}

fn unique_suffix() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
        .to_string()
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_migrations_are_idempotent() {
    let pool = migrated_pool().await;
    db::migrate(&pool).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables \
         WHERE table_schema = 'seller_api' ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(tables, vec!["buyer_profile", "seller_profile"]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_buyer_profile_saved_through_api() {
    let pool = migrated_pool().await;
    let memory = MemoryBackend::new();
    let server = TestServer::spawn(&memory, pool.clone(), false).await;
    let app = storefront(&memory, &server.url);

    let email = unique_email("buyer");
    let mut form = BuyerProfileForm {
        profile: BuyerProfile {
            first_name: "Asha".to_string(),
            email: email.clone(),
            address: "12 MG Road".to_string(),
            city: "Jaipur".to_string(),
            postal_code: "302001".to_string(),
            ..BuyerProfile::default()
        },
        ..BuyerProfileForm::default()
    };

    let status = form.submit(app.api()).await.clone();
    assert_eq!(status, FormStatus::Saved("Buyer Profile Saved!".to_string()));

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM seller_api.buyer_profile WHERE email = $1")
            .bind(&email)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);

    app.shutdown();
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_seller_profile_form_clears_after_save() {
    let pool = migrated_pool().await;
    let memory = MemoryBackend::new();
    let server = TestServer::spawn(&memory, pool.clone(), false).await;
    let app = storefront(&memory, &server.url);

    let email = unique_email("shop");
    let mut form = SellerProfileForm {
        profile: SellerProfile {
            shop_name: "Clay Corner".to_string(),
            location: "Khurja".to_string(),
            contact_email: email.clone(),
            aadhar_id: "1234 5678 9012".to_string(),
            ..SellerProfile::default()
        },
        ..SellerProfileForm::default()
    };

    let status = form.submit(app.api()).await.clone();
    assert_eq!(
        status,
        FormStatus::Saved("Profile Saved Successfully!".to_string())
    );
    assert_eq!(form.profile, SellerProfile::default());

    let repo = ProfileRepository::new(&pool);
    assert_eq!(repo.count_sellers_by_email(&email).await.unwrap(), 1);

    app.shutdown();
}
