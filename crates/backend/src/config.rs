//! Firebase configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FIREBASE_API_KEY` - Web API key of the Firebase project
//! - `FIREBASE_PROJECT_ID` - Project id (e.g., artisan-market-1a2b3)
//! - `FIREBASE_STORAGE_BUCKET` - Storage bucket (e.g., artisan-market.appspot.com)
//!
//! ## Optional
//! - `FIREBASE_POLL_INTERVAL_SECS` - Live subscription poll interval (default: 5)
//! - `FIREBASE_AUTH_URL` - Identity Toolkit base URL (emulator override)
//! - `FIREBASE_TOKEN_URL` - Secure Token base URL (emulator override)
//! - `FIREBASE_FIRESTORE_URL` - Firestore base URL (emulator override)
//! - `FIREBASE_STORAGE_URL` - Storage base URL (emulator override)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_STORAGE_URL: &str = "https://firebasestorage.googleapis.com/v0";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Blocklist of placeholder values copied out of sample `.env` files.
const PLACEHOLDER_PATTERNS: &[&str] = &["your-", "changeme", "replace", "placeholder", "xxx"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Firebase project configuration.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Web API key
    pub api_key: SecretString,
    /// Project id
    pub project_id: String,
    /// Storage bucket name
    pub storage_bucket: String,
    /// How often live subscriptions re-read their collection
    pub poll_interval: Duration,
    /// Service endpoints
    pub endpoints: FirebaseEndpoints,
}

/// Base URLs of the Firebase REST APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseEndpoints {
    pub auth: String,
    pub token: String,
    pub firestore: String,
    pub storage: String,
}

impl Default for FirebaseEndpoints {
    fn default() -> Self {
        Self {
            auth: DEFAULT_AUTH_URL.to_string(),
            token: DEFAULT_TOKEN_URL.to_string(),
            firestore: DEFAULT_FIRESTORE_URL.to_string(),
            storage: DEFAULT_STORAGE_URL.to_string(),
        }
    }
}

impl FirebaseConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let api_key = get_required_env("FIREBASE_API_KEY")?;
        reject_placeholder(&api_key, "FIREBASE_API_KEY")?;

        let poll_secs = get_env_or_default(
            "FIREBASE_POLL_INTERVAL_SECS",
            &DEFAULT_POLL_INTERVAL_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("FIREBASE_POLL_INTERVAL_SECS".to_string(), e.to_string())
        })?;
        if poll_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "FIREBASE_POLL_INTERVAL_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_key: SecretString::from(api_key),
            project_id: get_required_env("FIREBASE_PROJECT_ID")?,
            storage_bucket: get_required_env("FIREBASE_STORAGE_BUCKET")?,
            poll_interval: Duration::from_secs(poll_secs),
            endpoints: FirebaseEndpoints {
                auth: get_env_or_default("FIREBASE_AUTH_URL", DEFAULT_AUTH_URL),
                token: get_env_or_default("FIREBASE_TOKEN_URL", DEFAULT_TOKEN_URL),
                firestore: get_env_or_default("FIREBASE_FIRESTORE_URL", DEFAULT_FIRESTORE_URL),
                storage: get_env_or_default("FIREBASE_STORAGE_URL", DEFAULT_STORAGE_URL),
            },
        })
    }

    /// Configuration for a project with the default endpoints.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        project_id: impl Into<String>,
        storage_bucket: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            project_id: project_id.into(),
            storage_bucket: storage_bucket.into(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            endpoints: FirebaseEndpoints::default(),
        }
    }

    /// Resource path of the project's default database documents.
    #[must_use]
    pub fn documents_path(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.project_id
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn reject_placeholder(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    match PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        Some(pattern) => Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        )),
        None => Ok(()),
    }
}
