//! Error types for the backend collaborators.
//!
//! One enum per external service, mirroring the error taxonomy the
//! application layer reports to users.

use thiserror::Error;

/// Errors from the managed authentication service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The service rejected the email/password pair. Carries the service's
    /// own message so callers can surface it.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Registration with an email that already has an account.
    #[error("email already in use")]
    EmailAlreadyInUse,

    /// Registration with a password the service considers too weak.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Malformed email address.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] artisan_core::EmailError),

    /// The operation needs a signed-in identity.
    #[error("not signed in")]
    NotSignedIn,

    /// A bearer token failed verification.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Any other error code returned by the service.
    #[error("auth service rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    /// Network failure talking to the service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service could not be reached or refused to act.
    #[error("auth service unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the managed document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network failure talking to the store.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with an error status.
    #[error("document store error: {status} - {message}")]
    Service { status: u16, message: String },

    /// Security rules refused the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A document could not be decoded into the requested type.
    #[error("failed to decode document: {0}")]
    Decode(#[from] serde_json::Error),

    /// A value could not be encoded as document fields.
    #[error("failed to encode document: {0}")]
    Encode(String),

    /// The store could not be reached or refused to act.
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the managed object storage.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Network failure during upload.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage answered with an error status.
    #[error("storage error: {status} - {message}")]
    Service { status: u16, message: String },

    /// The upload succeeded but no download URL could be derived.
    #[error("upload response did not include a download token")]
    MissingDownloadUrl,

    /// Storage could not be reached or refused to act.
    #[error("object storage unavailable: {0}")]
    Unavailable(String),
}
