//! Account registration and email verification.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use artisan_backend::document::to_fields;
use artisan_backend::{AuthError, DocumentStore, Identity};
use artisan_core::models::{USERS_COLLECTION, UserRecord, ValidationError};
use artisan_core::{Credentials, Role};

use crate::error::{Result, add_breadcrumb};
use crate::routes::LOGIN_PATH;
use crate::session::SessionStore;

/// Shown after a verification email was sent.
pub const VERIFICATION_RESENT: &str = "Verification email resent. Please check your inbox.";

/// Register form input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub role: Role,
}

impl Registration {
    /// A buyer registration.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: SecretString::from(password.into()),
            role: Role::default(),
        }
    }

    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let blank: Vec<&'static str> = [
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("password", self.password.expose_secret()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();
        if blank.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(blank))
        }
    }
}

/// Create the account, write its `users/{uid}` document and go to login.
///
/// # Errors
///
/// Returns `Validation` for blank fields, `Auth` if the auth service
/// refuses the account (for example `EmailAlreadyInUse`), or `Store` if the
/// user document cannot be written.
#[instrument(skip(session, store, registration), fields(email = %registration.email, role = %registration.role))]
pub async fn register(
    session: &SessionStore,
    store: &dyn DocumentStore,
    registration: &Registration,
) -> Result<Identity> {
    registration.validate()?;
    let credentials = Credentials::new(
        registration.email.trim(),
        registration.password.expose_secret(),
    )
    .map_err(AuthError::from)?;

    let identity = session.auth().sign_up(&credentials).await?;

    let record = UserRecord {
        name: registration.name.trim().to_string(),
        email: credentials.email.to_string(),
        role: Some(registration.role.as_str().to_string()),
        created_at: Some(Utc::now()),
    };
    store
        .write_one(USERS_COLLECTION, identity.uid.as_str(), to_fields(&record)?)
        .await
        .inspect_err(|e| {
            tracing::error!(uid = %identity.uid, error = %e, "Account created but user document write failed");
        })?;

    session.refresh_role().await;
    session.navigator().navigate(LOGIN_PATH);
    add_breadcrumb("auth", "Registered", Some(&[("role", registration.role.as_str())][..]));
    tracing::info!(uid = %identity.uid, "Registered");

    Ok(identity)
}

/// Send another verification email to the signed-in user.
///
/// # Errors
///
/// Returns `NotSignedIn` (as `Auth`) without an identity, or the service
/// error.
pub async fn resend_verification(session: &SessionStore) -> Result<&'static str> {
    session.auth().send_email_verification().await?;
    tracing::info!("Verification email resent");
    Ok(VERIFICATION_RESENT)
}
