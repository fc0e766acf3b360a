//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FIREBASE_API_KEY`, `FIREBASE_PROJECT_ID`, `FIREBASE_STORAGE_BUCKET` -
//!   see [`artisan_backend::config`]
//!
//! ## Optional
//! - `ARTISAN_LOCAL_API_URL` - Base URL of the seller API (default: <http://localhost:5000>)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use artisan_backend::config::{self as backend_config, FirebaseConfig};
use thiserror::Error;
use url::Url;

const DEFAULT_LOCAL_API_URL: &str = "http://localhost:5000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Backend(#[from] backend_config::ConfigError),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Firebase project the storefront talks to
    pub firebase: FirebaseConfig,
    /// Base URL of the local seller API
    pub local_api_url: Url,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let firebase = FirebaseConfig::from_env()?;
        let local_api_url = parse_base_url(
            "ARTISAN_LOCAL_API_URL",
            &get_env_or_default("ARTISAN_LOCAL_API_URL", DEFAULT_LOCAL_API_URL),
        )?;
        let sentry_dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty());

        Ok(Self {
            firebase,
            local_api_url,
            sentry_dsn,
        })
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a base URL, making sure it ends in `/` so relative joins keep the
/// full path.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("K", "http://localhost:5000").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/");

        let url = parse_base_url("K", "https://api.example.in/market").unwrap();
        assert_eq!(url.as_str(), "https://api.example.in/market/");
    }

    #[test]
    fn test_parse_base_url_rejects_bad_input() {
        assert!(parse_base_url("K", "not a url").is_err());
        assert!(matches!(
            parse_base_url("K", "ftp://files.example.in"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }
}
