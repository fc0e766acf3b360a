//! Capability traits for the managed backend services.
//!
//! Each trait is object safe so an application holds `Arc<dyn Trait>` and
//! can swap the Firebase clients for the in-memory ones in tests.

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::mpsc;

use artisan_core::{Credentials, UserId};

use crate::document::{Document, Fields, Query, Snapshot};
use crate::error::{AuthError, StoreError, UploadError};
use crate::identity::Identity;
use crate::subscription::Subscription;

/// Managed authentication.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Sign in with email and password.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError>;

    /// Create an account and sign in as it.
    async fn sign_up(&self, credentials: &Credentials) -> Result<Identity, AuthError>;

    /// Sign the current identity out.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Send a verification email to the signed-in identity.
    async fn send_email_verification(&self) -> Result<(), AuthError>;

    /// Identity changes, starting with the current identity.
    fn identity_changes(&self) -> Subscription<Option<Identity>>;

    /// The signed-in identity, if any.
    fn current_identity(&self) -> Option<Identity>;
}

/// Bearer tokens for the signed-in identity.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// A fresh ID token, or `None` when nobody is signed in.
    async fn id_token(&self) -> Result<Option<SecretString>, AuthError>;
}

/// Server-side verification of bearer tokens.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Resolve a token to the user it was issued for.
    async fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}

/// Managed document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document. `Ok(None)` when it does not exist.
    async fn read_one(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Read every document in `collection` matching `query`.
    async fn read_query(&self, collection: &str, query: &Query)
    -> Result<Vec<Document>, StoreError>;

    /// Replace (or create) a document with exactly `fields`.
    async fn write_one(&self, collection: &str, id: &str, fields: Fields)
    -> Result<(), StoreError>;

    /// Create a document with a store-assigned id and return the id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete_one(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Live snapshots of a whole collection, starting with its current state.
    fn subscribe(&self, collection: &str) -> Subscription<Snapshot>;
}

/// Progress of an in-flight upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Completion percentage in `0..=100`.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let pct = self.bytes_transferred.min(self.total_bytes) * 100 / self.total_bytes;
        u8::try_from(pct).unwrap_or(100)
    }
}

/// Where upload progress events are sent.
pub type ProgressSender = mpsc::UnboundedSender<UploadProgress>;

/// Managed object storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload `bytes` to `path` and return a public download URL.
    ///
    /// Progress events, if requested, are sent before the call returns.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        progress: Option<ProgressSender>,
    ) -> Result<String, UploadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_percent() {
        let p = |done, total| {
            UploadProgress {
                bytes_transferred: done,
                total_bytes: total,
            }
            .percent()
        };
        assert_eq!(p(0, 200), 0);
        assert_eq!(p(50, 200), 25);
        assert_eq!(p(200, 200), 100);
        assert_eq!(p(0, 0), 100);
    }
}
