//! Profile repository.

use sqlx::PgPool;
use tracing::instrument;

use artisan_core::ProfileId;
use artisan_core::models::{BuyerProfile, SellerProfile};

use super::RepositoryError;

/// Repository for buyer and seller profile submissions.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a buyer profile and return its new id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, profile))]
    pub async fn insert_buyer(&self, profile: &BuyerProfile) -> Result<ProfileId, RepositoryError> {
        let id = sqlx::query_scalar::<_, ProfileId>(
            r"
            INSERT INTO seller_api.buyer_profile
                (id, first_name, last_name, email, phone_number, address, city, state, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(ProfileId::generate())
        .bind(profile.first_name.trim())
        .bind(profile.last_name.trim())
        .bind(profile.email.trim())
        .bind(profile.phone_number.trim())
        .bind(profile.address.trim())
        .bind(profile.city.trim())
        .bind(profile.state.trim())
        .bind(profile.postal_code.trim())
        .fetch_one(self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(id)
    }

    /// Store a seller profile and return its new id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, profile))]
    pub async fn insert_seller(
        &self,
        profile: &SellerProfile,
    ) -> Result<ProfileId, RepositoryError> {
        let id = sqlx::query_scalar::<_, ProfileId>(
            r"
            INSERT INTO seller_api.seller_profile
                (id, shop_name, bio, location, contact_email,
                 instagram_url, facebook_url, pinterest_url, aadhar_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(ProfileId::generate())
        .bind(profile.shop_name.trim())
        .bind(profile.bio.trim())
        .bind(profile.location.trim())
        .bind(profile.contact_email.trim())
        .bind(profile.instagram_url.trim())
        .bind(profile.facebook_url.trim())
        .bind(profile.pinterest_url.trim())
        .bind(profile.aadhar_id.trim())
        .fetch_one(self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(id)
    }

    /// Number of stored seller profiles with this contact email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_sellers_by_email(&self, contact_email: &str) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM seller_api.seller_profile WHERE contact_email = $1",
        )
        .bind(contact_email)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }
}

fn map_insert_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(db_err.message().to_string());
    }
    RepositoryError::Database(e)
}
