//! Firebase REST clients.
//!
//! # APIs
//!
//! ## Identity Toolkit / Secure Token
//! - Email and password sign-in and sign-up
//! - ID token refresh, email verification, token lookup
//!
//! ## Cloud Firestore
//! - Document reads, whole-record writes, structured queries
//! - Live collection snapshots by polling `runQuery`
//!
//! ## Cloud Storage
//! - Media uploads returning a tokenised download URL
//!
//! Every client shares one `reqwest::Client`. Requests made while a user is
//! signed in carry that user's ID token so project security rules apply.

mod auth;
mod firestore;
mod storage;
pub mod value;

pub use auth::{FirebaseAuth, FirebaseTokenVerifier};
pub use firestore::Firestore;
pub use storage::FirebaseStorage;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::Backend;
use crate::config::FirebaseConfig;
use crate::service::TokenSource;

const USER_AGENT: &str = concat!("artisan-market/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Firebase clients wired to one project.
#[derive(Clone)]
pub struct FirebaseServices {
    pub auth: Arc<FirebaseAuth>,
    pub store: Arc<Firestore>,
    pub storage: Arc<FirebaseStorage>,
}

impl FirebaseServices {
    /// Build the clients for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &FirebaseConfig) -> Result<Self, reqwest::Error> {
        let client = http_client()?;
        let auth = Arc::new(FirebaseAuth::new(client.clone(), config));
        let tokens: Arc<dyn TokenSource> = auth.clone();
        let store = Arc::new(Firestore::new(client.clone(), config, Some(tokens.clone())));
        let storage = Arc::new(FirebaseStorage::new(client, config, Some(tokens)));
        Ok(Self {
            auth,
            store,
            storage,
        })
    }

    /// Erase the concrete client types.
    #[must_use]
    pub fn into_backend(self) -> Backend {
        let tokens: Arc<dyn TokenSource> = self.auth.clone();
        Backend {
            tokens: Some(tokens),
            auth: self.auth,
            store: self.store,
            storage: self.storage,
        }
    }
}

/// Shared HTTP client configuration.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Error body shared by the Google REST APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Pull the `error.message` out of a failed response body, falling back to
/// the raw text.
fn error_message(body: &str) -> (String, Option<String>) {
    serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| (body.trim().to_string(), None),
        |envelope| (envelope.error.message, envelope.error.status),
    )
}
