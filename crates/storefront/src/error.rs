//! Unified error handling with Sentry integration.
//!
//! Every storefront operation returns `Result<T, AppError>`. Views never show
//! an error's `Display` output; they show [`AppError::user_message`], which
//! keeps internal details out of the UI.

use thiserror::Error;

use artisan_backend::{AuthError, StoreError, UploadError};
use artisan_core::models::ValidationError;
use artisan_core::types::category::capitalize;

use crate::api::ApiError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Document store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Image upload failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Seller API request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Form input was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    NotSignedIn,

    /// The signed-in user may not touch this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// The message shown to the user for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials(message) => message.clone(),
                AuthError::EmailAlreadyInUse => "This email has already been registered".to_string(),
                AuthError::WeakPassword(message) => message.clone(),
                AuthError::InvalidEmail(_) => "Please enter a valid email address".to_string(),
                AuthError::NotSignedIn | AuthError::InvalidToken => {
                    "Please log in to continue".to_string()
                }
                _ => "Authentication failed. Please try again.".to_string(),
            },
            Self::Store(StoreError::PermissionDenied(_)) => {
                "You don't have permission to do that".to_string()
            }
            Self::Store(_) => "Something went wrong. Please try again.".to_string(),
            Self::Upload(_) => "Failed to upload image. Please try again.".to_string(),
            Self::Api(err) if err.is_not_found() => "That item no longer exists".to_string(),
            Self::Api(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Validation(err) => match err {
                ValidationError::MissingFields(_) => "Please fill in all required fields".to_string(),
                ValidationError::Invalid { .. } => capitalize(&err.to_string()),
            },
            Self::NotSignedIn => "You must be logged in to do that".to_string(),
            Self::Forbidden(_) => "You don't have permission to do that".to_string(),
            Self::NotFound(what) => format!("{what} not found"),
        }
    }

    /// Report the error to Sentry if it is not the user's fault.
    pub fn report(&self) {
        if matches!(self, Self::Store(_) | Self::Upload(_) | Self::Api(_)) {
            let event_id = sentry::capture_error(self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Operation failed");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
