//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! artisan migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SELLER_API_DATABASE_URL` - `PostgreSQL` connection string for the seller
//!   API (falls back to `DATABASE_URL`)
//!
//! Migration files live in `crates/seller-api/migrations/` and are embedded
//! at build time.

use secrecy::SecretString;
use thiserror::Error;

use artisan_seller_api::db;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the seller API migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the database cannot be
/// reached, or a migration fails.
pub async fn seller_api() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SELLER_API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| MigrationError::MissingEnvVar("SELLER_API_DATABASE_URL"))?;

    tracing::info!("Connecting to seller API database...");
    let pool = db::create_pool(&SecretString::from(database_url)).await?;

    tracing::info!(
        migrations = db::MIGRATOR.iter().count(),
        "Running seller API migrations..."
    );
    db::migrate(&pool).await?;

    tracing::info!("Seller API migrations complete!");
    Ok(())
}
