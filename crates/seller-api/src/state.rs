//! Application state shared across handlers.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use moka::Expiry;
use moka::future::Cache;
use serde::Deserialize;
use sqlx::PgPool;

use artisan_backend::{DocumentStore, TokenVerifier};
use artisan_core::UserId;

/// How long a verified bearer token maps to its uid without re-checking.
/// Never longer than the token itself is valid.
const TOKEN_CACHE_TTL: Duration = Duration::from_secs(300);
const TOKEN_CACHE_CAPACITY: u64 = 10_000;

/// A bearer token that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub uid: UserId,
    /// The token's `exp` claim, when it is a JWT that carries one.
    pub expires_at: Option<SystemTime>,
}

impl VerifiedToken {
    #[must_use]
    pub fn new(token: &str, uid: UserId) -> Self {
        Self {
            uid,
            expires_at: jwt_expiry(token),
        }
    }

    /// How long this entry may stay cached, counted from `now`.
    #[must_use]
    pub fn cache_lifetime(&self, now: SystemTime) -> Duration {
        self.expires_at.map_or(TOKEN_CACHE_TTL, |expires_at| {
            expires_at
                .duration_since(now)
                .unwrap_or(Duration::ZERO)
                .min(TOKEN_CACHE_TTL)
        })
    }
}

#[derive(Deserialize)]
struct ExpClaim {
    exp: u64,
}

/// Read the `exp` claim from a JWT payload without checking the signature.
/// The verifier has already accepted the token.
fn jwt_expiry(token: &str) -> Option<SystemTime> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claim: ExpClaim = serde_json::from_slice(&bytes).ok()?;
    UNIX_EPOCH.checked_add(Duration::from_secs(claim.exp))
}

struct TokenExpiry;

impl Expiry<String, VerifiedToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &VerifiedToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.cache_lifetime(SystemTime::now()))
    }
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    store: Arc<dyn DocumentStore>,
    verifier: Arc<dyn TokenVerifier>,
    verified_tokens: Cache<String, VerifiedToken>,
    require_auth: bool,
}

impl AppState {
    /// Create the application state.
    ///
    /// With `require_auth` set, every `/api` request must carry a bearer
    /// token that `verifier` accepts.
    #[must_use]
    pub fn new(
        pool: PgPool,
        store: Arc<dyn DocumentStore>,
        verifier: Arc<dyn TokenVerifier>,
        require_auth: bool,
    ) -> Self {
        let verified_tokens = Cache::builder()
            .max_capacity(TOKEN_CACHE_CAPACITY)
            .expire_after(TokenExpiry)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                pool,
                store,
                verifier,
                verified_tokens,
                require_auth,
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The document store holding items and orders.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.inner.verifier.as_ref()
    }

    /// Verified token cache. Entries expire with their token.
    #[must_use]
    pub fn verified_tokens(&self) -> &Cache<String, VerifiedToken> {
        &self.inner.verified_tokens
    }

    #[must_use]
    pub fn require_auth(&self) -> bool {
        self.inner.require_auth
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("require_auth", &self.inner.require_auth)
            .field("cached_tokens", &self.inner.verified_tokens.entry_count())
            .finish_non_exhaustive()
    }
}
