//! Firebase Authentication over the Identity Toolkit REST API.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use artisan_core::{Credentials, Email, UserId};

use super::error_message;
use crate::config::FirebaseConfig;
use crate::error::AuthError;
use crate::identity::Identity;
use crate::service::{AuthService, TokenSource, TokenVerifier};
use crate::subscription::{Broadcaster, Subscription};

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Thin caller for `accounts:*` endpoints.
#[derive(Clone)]
struct IdentityToolkit {
    client: reqwest::Client,
    auth_url: String,
    token_url: String,
    api_key: SecretString,
}

impl IdentityToolkit {
    fn new(client: reqwest::Client, config: &FirebaseConfig) -> Self {
        Self {
            client,
            auth_url: config.endpoints.auth.trim_end_matches('/').to_string(),
            token_url: config.endpoints.token.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T, AuthError> {
        let url = format!("{}/accounts:{endpoint}", self.auth_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_error(&error_message(&text).0));
        }
        Ok(response.json().await?)
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<RefreshResponse, AuthError> {
        let url = format!("{}/token", self.token_url);
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret()),
        ];
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_error(&error_message(&text).0));
        }
        Ok(response.json().await?)
    }

    async fn lookup(&self, id_token: &str) -> Result<LookupUser, AuthError> {
        let response: LookupResponse = self.call("lookup", &json!({ "idToken": id_token })).await?;
        response
            .users
            .into_iter()
            .next()
            .ok_or(AuthError::InvalidToken)
    }
}

/// Map an Identity Toolkit error message (e.g. `WEAK_PASSWORD : Password
/// should be at least 6 characters`) to an [`AuthError`].
fn map_error(message: &str) -> AuthError {
    let (code, detail) = message
        .split_once(':')
        .map_or((message.trim(), ""), |(code, detail)| {
            (code.trim(), detail.trim())
        });
    match code {
        "EMAIL_EXISTS" => AuthError::EmailAlreadyInUse,
        "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthError::InvalidCredentials(message.trim().to_string())
        }
        "WEAK_PASSWORD" => AuthError::WeakPassword(if detail.is_empty() {
            code.to_string()
        } else {
            detail.to_string()
        }),
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" | "INVALID_REFRESH_TOKEN" => {
            AuthError::InvalidToken
        }
        _ => AuthError::Rejected {
            code: code.to_string(),
            message: message.trim().to_string(),
        },
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email_verified: bool,
}

struct AuthSession {
    identity: Identity,
    id_token: SecretString,
    refresh_token: SecretString,
    expires_at: DateTime<Utc>,
}

impl AuthSession {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) <= now
    }
}

fn expiry(expires_in: &str) -> DateTime<Utc> {
    let secs = expires_in.parse::<i64>().unwrap_or(3600);
    Utc::now() + Duration::seconds(secs)
}

fn parse_email(raw: Option<&str>) -> Option<Email> {
    raw.and_then(|email| Email::parse(email).ok())
}

/// Client-side Firebase Authentication session.
///
/// Holds at most one signed-in user and publishes every identity transition
/// to [`AuthService::identity_changes`] subscribers.
pub struct FirebaseAuth {
    toolkit: IdentityToolkit,
    session: Mutex<Option<AuthSession>>,
    changes: Broadcaster<Option<Identity>>,
}

impl FirebaseAuth {
    /// Create a signed-out client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: &FirebaseConfig) -> Self {
        Self {
            toolkit: IdentityToolkit::new(client, config),
            session: Mutex::new(None),
            changes: Broadcaster::replaying(None),
        }
    }

    /// Store a new session and publish the identity if the user changed.
    async fn establish(&self, response: SignInResponse) -> Identity {
        let email_verified = match self.toolkit.lookup(&response.id_token).await {
            Ok(user) => user.email_verified,
            Err(e) => {
                tracing::warn!(uid = %response.local_id, error = %e, "Account lookup after sign-in failed");
                false
            }
        };
        let identity = Identity {
            uid: UserId::new(response.local_id),
            email: parse_email(response.email.as_deref()),
            email_verified,
        };

        // Publish under the lock so events follow the order of state changes.
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = guard.as_ref().map(|s| &s.identity.uid) != Some(&identity.uid);
        *guard = Some(AuthSession {
            identity: identity.clone(),
            id_token: SecretString::from(response.id_token),
            refresh_token: SecretString::from(response.refresh_token),
            expires_at: expiry(&response.expires_in),
        });
        if changed {
            self.changes.publish(Some(identity.clone()));
        }
        drop(guard);
        identity
    }

    fn credentials_body(credentials: &Credentials) -> Value {
        json!({
            "email": credentials.email.as_str(),
            "password": credentials.password.expose_secret(),
            "returnSecureToken": true,
        })
    }
}

impl std::fmt::Debug for FirebaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAuth")
            .field("auth_url", &self.toolkit.auth_url)
            .field("signed_in", &self.current_identity().is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthService for FirebaseAuth {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let response: SignInResponse = self
            .toolkit
            .call("signInWithPassword", &Self::credentials_body(credentials))
            .await?;
        let identity = self.establish(response).await;
        debug!(uid = %identity.uid, "Signed in");
        Ok(identity)
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_up(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let response: SignInResponse = self
            .toolkit
            .call("signUp", &Self::credentials_body(credentials))
            .await?;
        let identity = self.establish(response).await;
        debug!(uid = %identity.uid, "Account created");
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = guard.take() {
            self.changes.publish(None);
            debug!(uid = %session.identity.uid, "Signed out");
        }
        drop(guard);
        Ok(())
    }

    async fn send_email_verification(&self) -> Result<(), AuthError> {
        let token = self.id_token().await?.ok_or(AuthError::NotSignedIn)?;
        let _: Value = self
            .toolkit
            .call(
                "sendOobCode",
                &json!({ "requestType": "VERIFY_EMAIL", "idToken": token.expose_secret() }),
            )
            .await?;
        Ok(())
    }

    fn identity_changes(&self) -> Subscription<Option<Identity>> {
        self.changes.subscribe()
    }

    fn current_identity(&self) -> Option<Identity> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.identity.clone())
    }
}

#[async_trait]
impl TokenSource for FirebaseAuth {
    async fn id_token(&self) -> Result<Option<SecretString>, AuthError> {
        let (uid, refresh_token) = {
            let guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(session) = guard.as_ref() else {
                return Ok(None);
            };
            if !session.needs_refresh(Utc::now()) {
                return Ok(Some(session.id_token.clone()));
            }
            (session.identity.uid.clone(), session.refresh_token.clone())
        };

        debug!(uid = %uid, "Refreshing ID token");
        let refreshed = self.toolkit.refresh(&refresh_token).await?;
        let id_token = SecretString::from(refreshed.id_token);

        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = guard.as_mut()
            && session.identity.uid == uid
        {
            session.id_token = id_token.clone();
            session.refresh_token = SecretString::from(refreshed.refresh_token);
            session.expires_at = expiry(&refreshed.expires_in);
        }
        Ok(Some(id_token))
    }
}

/// Server-side token check: resolves an ID token to its user via
/// `accounts:lookup`.
#[derive(Clone)]
pub struct FirebaseTokenVerifier {
    toolkit: IdentityToolkit,
}

impl FirebaseTokenVerifier {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &FirebaseConfig) -> Self {
        Self {
            toolkit: IdentityToolkit::new(client, config),
        }
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let user = self.toolkit.lookup(token).await?;
        Ok(UserId::new(user.local_id))
    }
}
