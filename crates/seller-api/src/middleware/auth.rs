//! Bearer token extractor.
//!
//! Requests may carry `Authorization: Bearer <id token>`. A token is checked
//! with the configured [`TokenVerifier`](artisan_backend::TokenVerifier) and
//! the resulting uid is cached for a few minutes, never past the token's
//! own expiry. Without a token the caller
//! is anonymous, unless the service requires authentication.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use artisan_backend::AuthError;
use artisan_core::UserId;

use crate::error::set_sentry_user;
use crate::state::{AppState, VerifiedToken};

/// The verified uid of the caller, if a bearer token was presented.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Caller(uid): Caller) -> impl IntoResponse {
///     match uid {
///         Some(uid) => format!("Hello, {uid}!"),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Option<UserId>);

/// Why a request's credentials were refused.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    /// No token, and the service requires one.
    MissingToken,
    /// The header is malformed or the token was refused.
    InvalidToken,
    /// The token could not be checked right now.
    VerifierUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "Missing bearer token").into_response(),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid bearer token").into_response(),
            Self::VerifierUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Authentication service unavailable",
            )
                .into_response(),
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AuthRejection> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthRejection::InvalidToken)?;
    let (scheme, token) = value.split_once(' ').ok_or(AuthRejection::InvalidToken)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthRejection::InvalidToken);
    }
    Ok(Some(token))
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts)? else {
            if state.require_auth() {
                return Err(AuthRejection::MissingToken);
            }
            return Ok(Self(None));
        };

        if let Some(cached) = state.verified_tokens().get(token).await {
            set_sentry_user(&cached.uid);
            return Ok(Self(Some(cached.uid)));
        }

        let uid = state.verifier().verify(token).await.map_err(|e| match e {
            AuthError::Http(_) | AuthError::Unavailable(_) => {
                tracing::warn!(error = %e, "Token verification unavailable");
                AuthRejection::VerifierUnavailable
            }
            _ => {
                tracing::debug!(error = %e, "Bearer token refused");
                AuthRejection::InvalidToken
            }
        })?;

        state
            .verified_tokens()
            .insert(token.to_string(), VerifiedToken::new(token, uid.clone()))
            .await;
        set_sentry_user(&uid);
        Ok(Self(Some(uid)))
    }
}
