//! Command implementations.

pub mod account;
pub mod catalog;
pub mod migrate;
pub mod profile;
pub mod seller;

use thiserror::Error;

use artisan_backend::AuthError;
use artisan_core::Credentials;
use artisan_storefront::app::AppInitError;
use artisan_storefront::config::{ConfigError, StorefrontConfig};
use artisan_storefront::{App, AppError};

use crate::LoginArgs;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The storefront could not start.
    #[error("Startup error: {0}")]
    Init(#[from] AppInitError),

    /// A storefront operation failed. Shown with its user-facing message.
    #[error("{}", .0.user_message())]
    App(#[from] AppError),

    /// Migration failure.
    #[error(transparent)]
    Migrate(#[from] migrate::MigrationError),

    /// Bad command line input.
    #[error("{0}")]
    InvalidArgument(String),

    /// Reading a local file failed.
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The signed-in account may not use this command.
    #[error("Access denied: {0}")]
    Denied(String),
}

impl From<AuthError> for CliError {
    fn from(e: AuthError) -> Self {
        Self::App(AppError::Auth(e))
    }
}

/// Start the storefront from the environment and wait for the session.
pub async fn start_app() -> Result<App, CliError> {
    let config = StorefrontConfig::from_env()?;
    let app = App::from_config(&config)?;
    app.session().resolved().await;
    Ok(app)
}

/// Sign in with the given flags, if both were supplied.
///
/// Returns whether a sign-in happened.
pub async fn sign_in(app: &App, login: &LoginArgs) -> Result<bool, CliError> {
    let (Some(email), Some(password)) = (&login.email, &login.password) else {
        return Ok(false);
    };
    let credentials = Credentials::new(email, password).map_err(AuthError::from)?;
    let identity = app.session().login(&credentials).await?;
    tracing::info!(uid = %identity.uid, "Signed in");
    Ok(true)
}

/// Write one line of command output.
#[allow(clippy::print_stdout)]
pub fn emit(line: impl std::fmt::Display) {
    println!("{line}");
}
