//! Profile submission routes.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use artisan_core::models::{BuyerProfile, ProfileSaved, SellerProfile};

use crate::db::ProfileRepository;
use crate::error::Result;
use crate::middleware::Caller;
use crate::state::AppState;

pub const BUYER_SAVED: &str = "Buyer Profile Saved!";
pub const SELLER_SAVED: &str = "Profile Saved Successfully!";

/// `POST /api/buyerProfile`
///
/// Anonymous submissions are accepted unless the service requires auth.
#[instrument(skip_all)]
pub async fn save_buyer(
    State(state): State<AppState>,
    Caller(_): Caller,
    Json(profile): Json<BuyerProfile>,
) -> Result<(StatusCode, Json<ProfileSaved>)> {
    profile.validate()?;
    let id = ProfileRepository::new(state.pool())
        .insert_buyer(&profile)
        .await?;

    tracing::info!(profile_id = %id, "Buyer profile stored");
    Ok((
        StatusCode::CREATED,
        Json(ProfileSaved {
            id,
            message: BUYER_SAVED.to_string(),
        }),
    ))
}

/// `POST /api/sellerProfile`
#[instrument(skip_all)]
pub async fn save_seller(
    State(state): State<AppState>,
    Caller(_): Caller,
    Json(profile): Json<SellerProfile>,
) -> Result<(StatusCode, Json<ProfileSaved>)> {
    profile.validate()?;
    let id = ProfileRepository::new(state.pool())
        .insert_seller(&profile)
        .await?;

    tracing::info!(profile_id = %id, shop_name = %profile.shop_name, "Seller profile stored");
    Ok((
        StatusCode::CREATED,
        Json(ProfileSaved {
            id,
            message: SELLER_SAVED.to_string(),
        }),
    ))
}
