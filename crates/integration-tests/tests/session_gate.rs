//! Registration, login and the role gate through the whole storefront.

#![allow(clippy::unwrap_used)]

use artisan_backend::memory::MemoryBackend;
use artisan_core::{Credentials, Role};
use artisan_integration_tests::{add_user, storefront};
use artisan_storefront::account::{self, Registration};
use artisan_storefront::routes::{LOGIN_PATH, UNAUTHORIZED_PATH};
use artisan_storefront::{Decision, SessionStatus};
use url::Url;

fn api_url() -> Url {
    // Nothing here talks to the seller API.
    Url::parse("http://127.0.0.1:1/").unwrap()
}

#[tokio::test]
async fn test_registered_seller_reaches_dashboard_after_login() {
    let memory = MemoryBackend::new();
    let app = storefront(&memory, &api_url());
    app.session().resolved().await;

    let registration =
        Registration::new("Meera", "meera@example.com", "secret1").with_role(Role::Seller);
    account::register(app.session(), app.backend().store.as_ref(), &registration)
        .await
        .unwrap();
    assert_eq!(app.navigator().current_path(), LOGIN_PATH);

    app.session().logout().await.unwrap();
    assert_eq!(
        app.open("/seller/dashboard").decision,
        Decision::RedirectLogin
    );

    app.session()
        .login(&Credentials::new("meera@example.com", "secret1").unwrap())
        .await
        .unwrap();
    let session = app.session().current_session();
    assert_eq!(session.status, SessionStatus::Resolved);
    assert_eq!(session.role, Some(Role::Seller));

    let view = app.open("/seller/my-products");
    assert!(view.renders());
    assert_eq!(app.navigator().current_path(), "/seller/my-products");

    app.shutdown();
}

#[tokio::test]
async fn test_buyer_is_sent_to_unauthorized() {
    let memory = MemoryBackend::new();
    add_user(&memory, "asha@example.com", "secret1", "user");
    let app = storefront(&memory, &api_url());
    app.session()
        .login(&Credentials::new("asha@example.com", "secret1").unwrap())
        .await
        .unwrap();

    for path in ["/seller/dashboard", "/seller/add-item", "/seller/my-products"] {
        assert_eq!(
            app.open(path).decision,
            Decision::RedirectUnauthorized,
            "{path}"
        );
        assert_eq!(app.navigator().current_path(), UNAUTHORIZED_PATH);
    }
    assert!(app.open("/checkout").renders());

    app.shutdown();
}

#[tokio::test]
async fn test_role_lookup_failure_degrades_to_no_role() {
    let memory = MemoryBackend::new();
    add_user(&memory, "ravi@example.com", "secret1", "seller");
    memory.store.set_fail_reads(true);
    let app = storefront(&memory, &api_url());

    app.session()
        .login(&Credentials::new("ravi@example.com", "secret1").unwrap())
        .await
        .unwrap();

    let session = app.session().current_session();
    assert!(session.identity.is_some());
    assert_eq!(session.role, None);
    assert_eq!(
        app.open("/seller/dashboard").decision,
        Decision::RedirectUnauthorized
    );
    assert!(app.open("/").renders());

    memory.store.set_fail_reads(false);
    assert_eq!(app.session().refresh_role().await, Some(Role::Seller));
    assert!(app.open("/seller/dashboard").renders());

    app.shutdown();
}
