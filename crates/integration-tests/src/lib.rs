//! Integration tests for Artisan Market.
//!
//! The tests run the seller API on an ephemeral port and drive it through
//! the storefront, both on top of the in-memory backend. No external
//! services are needed except for the tests marked `#[ignore]`, which need
//! `PostgreSQL`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p artisan-integration-tests
//!
//! # Including the database tests
//! DATABASE_URL=postgres://localhost/artisan_test \
//!     cargo test -p artisan-integration-tests -- --include-ignored
//! ```

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use artisan_backend::memory::MemoryBackend;
use artisan_backend::{Fields, TokenVerifier};
use artisan_core::UserId;
use artisan_core::models::USERS_COLLECTION;
use artisan_seller_api::AppState;
use artisan_storefront::App;
use artisan_storefront::api::LocalApiClient;

/// A pool pointed at a port nothing listens on. Any query fails quickly.
///
/// # Panics
///
/// Panics if the connection string does not parse.
#[must_use]
pub fn unreachable_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy("postgres://artisan@127.0.0.1:1/artisan_test")
        .expect("Failed to build lazy pool")
}

/// The seller API listening on `127.0.0.1` at an ephemeral port.
pub struct TestServer {
    pub url: Url,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve the seller API over `memory`, verifying the memory backend's
    /// tokens.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn(memory: &MemoryBackend, pool: PgPool, require_auth: bool) -> Self {
        let verifier: Arc<dyn TokenVerifier> = memory.auth.clone();
        let state = AppState::new(pool, memory.store.clone(), verifier, require_auth);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let app = artisan_seller_api::app(state);
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let url = Url::parse(&format!("http://{addr}/")).expect("Invalid server URL");
        Self { url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start the storefront over `memory`, talking to the seller API at `api_url`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn storefront(memory: &MemoryBackend, api_url: &Url) -> App {
    let backend = memory.backend();
    let api = LocalApiClient::new(api_url.clone(), backend.tokens.clone())
        .expect("Failed to build seller API client");
    App::start(backend, api)
}

/// Build document fields from a JSON object literal.
///
/// # Panics
///
/// Panics if `value` is not an object.
#[must_use]
pub fn fields(value: serde_json::Value) -> Fields {
    serde_json::from_value(value).expect("Document fields must be a JSON object")
}

/// Add an account and its `users` document with `role`.
///
/// # Panics
///
/// Panics if `email` is malformed.
pub fn add_user(memory: &MemoryBackend, email: &str, password: &str, role: &str) -> UserId {
    let uid = memory
        .auth
        .add_account(email, password)
        .expect("Invalid test email");
    memory.store.insert(
        USERS_COLLECTION,
        uid.as_str(),
        fields(serde_json::json!({ "name": email, "email": email, "role": role })),
    );
    uid
}
