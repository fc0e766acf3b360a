//! HTTP route handlers for the seller API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness
//! GET    /health/ready               - Readiness (database)
//! GET    /api/seller/items           - Items (the caller's, with a bearer token)
//! DELETE /api/seller/items/{id}      - Delete an owned item
//! GET    /api/seller/orders?status=  - Orders, optionally by status
//! POST   /api/buyerProfile           - Store a buyer profile
//! POST   /api/sellerProfile          - Store a seller profile
//! ```

pub mod health;
pub mod items;
pub mod orders;
pub mod profiles;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Build the application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/seller/items", get(items::list))
        .route("/api/seller/items/{id}", delete(items::delete))
        .route("/api/seller/orders", get(orders::list))
        .route("/api/buyerProfile", post(profiles::save_buyer))
        .route("/api/sellerProfile", post(profiles::save_seller))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use artisan_backend::memory::{MemoryAuth, MemoryBackend};
    use artisan_backend::{Fields, TokenVerifier};

    use super::*;

    fn fields(value: Value) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    struct Harness {
        memory: MemoryBackend,
        app: Router,
    }

    impl Harness {
        fn new(require_auth: bool) -> Self {
            let memory = MemoryBackend::new();
            let pool = PgPoolOptions::new()
                .connect_lazy("postgres://artisan@localhost/artisan_test")
                .unwrap();
            let verifier: Arc<dyn TokenVerifier> = memory.auth.clone();
            let state = AppState::new(pool, memory.store.clone(), verifier, require_auth);
            Self {
                memory,
                app: routes().with_state(state),
            }
        }

        fn seed(&self) -> (String, String) {
            let ravi = self.memory.auth.add_account("ravi@example.com", "secret1").unwrap();
            let meera = self.memory.auth.add_account("meera@example.com", "secret1").unwrap();
            self.memory.store.insert(
                "products",
                "vase",
                fields(json!({"name": "Vase", "price": 450, "sellerId": ravi.as_str()})),
            );
            self.memory.store.insert(
                "products",
                "shawl",
                fields(json!({"name": "Shawl", "price": 1200, "sellerId": meera.as_str()})),
            );
            self.memory.store.insert(
                "orders",
                "o1",
                fields(json!({
                    "sellerId": ravi.as_str(), "productName": "Vase",
                    "amount": 450, "status": "pending",
                })),
            );
            self.memory.store.insert(
                "orders",
                "o2",
                fields(json!({
                    "sellerId": ravi.as_str(), "productName": "Vase",
                    "amount": 450, "status": "completed",
                })),
            );
            (
                MemoryAuth::token_for(&ravi),
                MemoryAuth::token_for(&meera),
            )
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
            let response = self.app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, body.to_vec())
        }
    }

    fn get_with(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn delete_with(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("DELETE").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn names(body: &[u8]) -> Vec<String> {
        let mut names: Vec<String> = serde_json::from_slice::<Vec<Value>>(body)
            .unwrap()
            .iter()
            .map(|item| item["name"].as_str().unwrap().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_health() {
        let harness = Harness::new(false);
        let (status, body) = harness.send(get_with("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_items_are_scoped_to_bearer() {
        let harness = Harness::new(false);
        let (ravi, _) = harness.seed();

        let (status, body) = harness.send(get_with("/api/seller/items", Some(&ravi))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body), ["Vase"]);

        let (_, body) = harness.send(get_with("/api/seller/items", None)).await;
        assert_eq!(names(&body), ["Shawl", "Vase"]);
    }

    #[tokio::test]
    async fn test_invalid_or_missing_token() {
        let harness = Harness::new(true);
        harness.seed();

        let (status, _) = harness
            .send(get_with("/api/seller/items", Some("not-a-token")))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = harness.send(get_with("/api/seller/items", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_checks_ownership() {
        let harness = Harness::new(false);
        let (ravi, meera) = harness.seed();

        let (status, _) = harness
            .send(delete_with("/api/seller/items/vase", Some(&meera)))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(harness.memory.store.documents("products").len(), 2);

        let (status, _) = harness
            .send(delete_with("/api/seller/items/vase", Some(&ravi)))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(harness.memory.store.documents("products").len(), 1);

        let (status, _) = harness
            .send(delete_with("/api/seller/items/vase", Some(&ravi)))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_orders_filter_by_status() {
        let harness = Harness::new(false);
        let (ravi, meera) = harness.seed();

        let (status, body) = harness
            .send(get_with("/api/seller/orders?status=pending", Some(&ravi)))
            .await;
        assert_eq!(status, StatusCode::OK);
        let orders: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0]["id"], "o1");

        let (_, body) = harness
            .send(get_with("/api/seller/orders", Some(&ravi)))
            .await;
        assert_eq!(serde_json::from_slice::<Vec<Value>>(&body).unwrap().len(), 2);

        let (_, body) = harness
            .send(get_with("/api/seller/orders", Some(&meera)))
            .await;
        assert!(serde_json::from_slice::<Vec<Value>>(&body).unwrap().is_empty());

        let (status, _) = harness
            .send(get_with("/api/seller/orders?status=shipped", None))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_failure_is_bad_gateway() {
        let harness = Harness::new(false);
        harness.memory.store.set_fail_reads(true);

        let (status, body) = harness.send(get_with("/api/seller/items", None)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, b"External service error");
    }

    #[tokio::test]
    async fn test_profiles_require_token_when_auth_required() {
        let harness = Harness::new(true);

        for (uri, body) in [
            ("/api/buyerProfile", json!({"firstName": "Asha"})),
            ("/api/sellerProfile", json!({"shopName": "Mitti"})),
        ] {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();

            let (status, _) = harness.send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_incomplete_profile_is_rejected_before_storage() {
        let harness = Harness::new(false);
        let request = Request::builder()
            .method("POST")
            .uri("/api/sellerProfile")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"shopName": "Mitti"}).to_string()))
            .unwrap();

        let (status, body) = harness.send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = String::from_utf8(body).unwrap();
        assert!(message.contains("location"));
        assert!(message.contains("aadharId"));
    }
}
