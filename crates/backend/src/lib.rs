//! Artisan Market backend collaborators.
//!
//! The storefront is backed entirely by a managed backend-as-a-service:
//! authentication, a document database and object storage. This crate hides
//! each of them behind a capability trait so the rest of the workspace never
//! talks to a vendor SDK directly.
//!
//! # Implementations
//!
//! - [`firebase`] - REST clients for Firebase Auth, Cloud Firestore and Cloud
//!   Storage
//! - [`memory`] - In-process implementations for development and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use artisan_backend::{Backend, config::FirebaseConfig};
//!
//! let backend = Backend::firebase(&FirebaseConfig::from_env()?)?;
//! let identity = backend.auth.sign_in(&credentials).await?;
//! let doc = backend.store.read_one("users", identity.uid.as_str()).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod document;
pub mod error;
pub mod firebase;
pub mod identity;
pub mod memory;
pub mod service;
pub mod subscription;

use std::sync::Arc;

pub use document::{Document, Fields, Filter, FilterOp, Query, Snapshot};
pub use error::{AuthError, StoreError, UploadError};
pub use identity::Identity;
pub use service::{
    AuthService, DocumentStore, ObjectStorage, ProgressSender, TokenSource, TokenVerifier,
    UploadProgress,
};
pub use subscription::{Broadcaster, Subscription};

/// The set of backend services an application instance talks to.
///
/// Cheap to clone; every field is reference counted.
#[derive(Clone)]
pub struct Backend {
    /// Managed authentication.
    pub auth: Arc<dyn AuthService>,
    /// Bearer token capability, when the auth implementation offers one.
    pub tokens: Option<Arc<dyn TokenSource>>,
    /// Managed document database.
    pub store: Arc<dyn DocumentStore>,
    /// Managed object storage.
    pub storage: Arc<dyn ObjectStorage>,
}

impl Backend {
    /// Build the Firebase-backed service set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn firebase(config: &config::FirebaseConfig) -> Result<Self, reqwest::Error> {
        let services = firebase::FirebaseServices::new(config)?;
        Ok(services.into_backend())
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("tokens", &self.tokens.is_some())
            .finish_non_exhaustive()
    }
}
