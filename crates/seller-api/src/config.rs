//! Seller API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SELLER_API_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//! - `FIREBASE_API_KEY`, `FIREBASE_PROJECT_ID`, `FIREBASE_STORAGE_BUCKET` -
//!   see [`artisan_backend::config`]
//!
//! ## Optional
//! - `SELLER_API_HOST` - Bind address (default: 127.0.0.1)
//! - `SELLER_API_PORT` - Listen port (default: 5000)
//! - `SELLER_API_ALLOWED_ORIGIN` - Origin allowed by CORS (default: <http://localhost:3000>)
//! - `SELLER_API_REQUIRE_AUTH` - Reject requests without a bearer token (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use artisan_backend::config::{self as backend_config, FirebaseConfig};
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error(transparent)]
    Backend(#[from] backend_config::ConfigError),
}

/// Seller API configuration.
#[derive(Debug, Clone)]
pub struct SellerApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Origin allowed to call the API from a browser
    pub allowed_origin: String,
    /// Whether requests must carry a verified bearer token
    pub require_auth: bool,
    /// Firebase project holding items and orders
    pub firebase: FirebaseConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl SellerApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = std::env::var("SELLER_API_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| ConfigError::MissingEnvVar("SELLER_API_DATABASE_URL".to_string()))?;

        let host = get_env_or_default("SELLER_API_HOST", DEFAULT_HOST)
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SELLER_API_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SELLER_API_PORT", &DEFAULT_PORT.to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SELLER_API_PORT".to_string(), e.to_string()))?;
        let require_auth = parse_flag(
            "SELLER_API_REQUIRE_AUTH",
            &get_env_or_default("SELLER_API_REQUIRE_AUTH", "false"),
        )?;

        Ok(Self {
            database_url: SecretString::from(database_url),
            host,
            port,
            allowed_origin: get_env_or_default("SELLER_API_ALLOWED_ORIGIN", DEFAULT_ALLOWED_ORIGIN),
            require_auth,
            firebase: FirebaseConfig::from_env()?,
            sentry_dsn: optional_env("SENTRY_DSN"),
            sentry_environment: optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Get the socket address to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected true or false, got '{other}'"),
        )),
    }
}
