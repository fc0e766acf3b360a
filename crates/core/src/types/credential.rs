//! Sign-in credential types.

use secrecy::SecretString;

use crate::types::email::{Email, EmailError};

/// Email and password submitted to the auth service.
///
/// The password is held as a [`SecretString`] so it never shows up in
/// `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account email address.
    pub email: Email,
    /// Plain-text password, only exposed when building the sign-in request.
    pub password: SecretString,
}

impl Credentials {
    /// Build credentials from raw form input.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] if the email is malformed.
    pub fn new(email: &str, password: impl Into<String>) -> Result<Self, EmailError> {
        Ok(Self {
            email: Email::parse(email)?,
            password: SecretString::from(password.into()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let credentials = Credentials::new("a@b.com", "hunter22").unwrap();
        let debug = format!("{credentials:?}");
        assert!(debug.contains("a@b.com"));
        assert!(!debug.contains("hunter22"));
    }
}
