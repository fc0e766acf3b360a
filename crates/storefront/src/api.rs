//! Client for the local seller API.
//!
//! # Endpoints
//!
//! - `GET /api/seller/items`
//! - `DELETE /api/seller/items/{id}`
//! - `GET /api/seller/orders?status=`
//! - `POST /api/buyerProfile`
//! - `POST /api/sellerProfile`
//!
//! When the backend offers a [`TokenSource`], requests carry the signed-in
//! user's ID token as `Authorization: Bearer`.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use artisan_backend::{AuthError, TokenSource};
use artisan_core::models::{BuyerProfile, Order, Product, ProfileSaved, SellerProfile};
use artisan_core::{OrderStatus, ProductId};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors from the local seller API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure or undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("seller API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// An endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The bearer token could not be obtained.
    #[error("could not obtain ID token: {0}")]
    Token(#[from] AuthError),
}

impl ApiError {
    /// Whether the API reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// HTTP client for the seller API.
#[derive(Clone)]
pub struct LocalApiClient {
    client: reqwest::Client,
    base_url: Url,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl std::fmt::Debug for LocalApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.tokens.is_some())
            .finish_non_exhaustive()
    }
}

impl LocalApiClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: Url, tokens: Option<Arc<dyn TokenSource>>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url,
            tokens,
        })
    }

    /// The base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Items of the signed-in seller.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn seller_items(&self) -> Result<Vec<Product>, ApiError> {
        let request = self.client.get(self.endpoint("api/seller/items")?);
        let items: Vec<Product> = self.send(request).await?.json().await?;
        debug!(count = items.len(), "Fetched seller items");
        Ok(items)
    }

    /// Delete one of the seller's items.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the item is not deletable.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_seller_item(&self, id: &ProductId) -> Result<(), ApiError> {
        let path = format!("api/seller/items/{}", urlencoding::encode(id.as_str()));
        let request = self.client.delete(self.endpoint(&path)?);
        self.send(request).await?;
        Ok(())
    }

    /// Orders for the signed-in seller, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn seller_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, ApiError> {
        let mut request = self.client.get(self.endpoint("api/seller/orders")?);
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        Ok(self.send(request).await?.json().await?)
    }

    /// Save the buyer profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the API rejects the profile.
    pub async fn save_buyer_profile(&self, profile: &BuyerProfile) -> Result<ProfileSaved, ApiError> {
        self.post_json("api/buyerProfile", profile).await
    }

    /// Save the seller profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the API rejects the profile.
    pub async fn save_seller_profile(
        &self,
        profile: &SellerProfile,
    ) -> Result<ProfileSaved, ApiError> {
        self.post_json("api/sellerProfile", profile).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.client.post(self.endpoint(path)?).json(body);
        Ok(self.send(request).await?.json().await?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    async fn send(&self, mut request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        if let Some(tokens) = &self.tokens
            && let Some(token) = tokens.id_token().await?
        {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), message = %message, "Seller API request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
