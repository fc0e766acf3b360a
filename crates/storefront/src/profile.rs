//! Buyer and seller profile forms.

use tracing::instrument;

use artisan_core::models::{BuyerProfile, ProfileSaved, SellerProfile};

use crate::api::LocalApiClient;
use crate::error::{AppError, Result};

/// Shown when the seller API refuses or cannot be reached.
pub const SAVE_FAILED: &str = "Error saving profile. Please try again.";

/// Validate and post the buyer profile.
///
/// # Errors
///
/// Returns `Validation` before any request is made, or `Api`.
#[instrument(skip_all)]
pub async fn save_buyer_profile(api: &LocalApiClient, profile: &BuyerProfile) -> Result<ProfileSaved> {
    profile.validate()?;
    let saved = api.save_buyer_profile(profile).await?;
    tracing::info!(profile_id = %saved.id, "Buyer profile saved");
    Ok(saved)
}

/// Validate and post the seller profile.
///
/// # Errors
///
/// Returns `Validation` before any request is made, or `Api`.
#[instrument(skip_all)]
pub async fn save_seller_profile(
    api: &LocalApiClient,
    profile: &SellerProfile,
) -> Result<ProfileSaved> {
    profile.validate()?;
    let saved = api.save_seller_profile(profile).await?;
    tracing::info!(profile_id = %saved.id, "Seller profile saved");
    Ok(saved)
}

/// Banner shown above a profile form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormStatus {
    #[default]
    Idle,
    Saved(String),
    Failed(String),
}

fn failure_message(err: &AppError) -> String {
    match err {
        AppError::Validation(_) => err.user_message(),
        _ => {
            err.report();
            SAVE_FAILED.to_string()
        }
    }
}

/// Buyer profile page state. Values stay in the form after saving.
#[derive(Debug, Clone, Default)]
pub struct BuyerProfileForm {
    pub profile: BuyerProfile,
    pub status: FormStatus,
}

impl BuyerProfileForm {
    pub async fn submit(&mut self, api: &LocalApiClient) -> &FormStatus {
        self.status = match save_buyer_profile(api, &self.profile).await {
            Ok(saved) => FormStatus::Saved(saved.message),
            Err(e) => FormStatus::Failed(failure_message(&e)),
        };
        &self.status
    }
}

/// Seller profile page state. The form is cleared after a successful save.
#[derive(Debug, Clone, Default)]
pub struct SellerProfileForm {
    pub profile: SellerProfile,
    pub status: FormStatus,
}

impl SellerProfileForm {
    pub async fn submit(&mut self, api: &LocalApiClient) -> &FormStatus {
        self.status = match save_seller_profile(api, &self.profile).await {
            Ok(saved) => {
                self.profile = SellerProfile::default();
                FormStatus::Saved(saved.message)
            }
            Err(e) => FormStatus::Failed(failure_message(&e)),
        };
        &self.status
    }
}
