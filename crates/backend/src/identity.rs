//! Identities issued by the auth service.

use serde::{Deserialize, Serialize};

use artisan_core::{Email, UserId};

/// Opaque handle for an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id assigned by the auth service.
    pub uid: UserId,
    /// Sign-in email, when the account has one.
    pub email: Option<Email>,
    /// Whether the email address has been verified.
    #[serde(default)]
    pub email_verified: bool,
}

impl Identity {
    /// Create an identity with an unverified email.
    #[must_use]
    pub fn new(uid: impl Into<UserId>, email: Option<Email>) -> Self {
        Self {
            uid: uid.into(),
            email,
            email_verified: false,
        }
    }
}
