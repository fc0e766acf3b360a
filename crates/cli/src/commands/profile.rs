//! Profile form commands.

use clap::Args;

use artisan_core::models::{BuyerProfile, SellerProfile};
use artisan_storefront::profile::{BuyerProfileForm, FormStatus, SellerProfileForm};

use super::{CliError, emit, start_app};

/// Buyer shipping details.
#[derive(Args, Debug, Clone)]
pub struct BuyerArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "")]
    pub phone_number: String,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub city: String,
    #[arg(long, default_value = "")]
    pub state: String,
    #[arg(long)]
    pub postal_code: String,
}

impl From<BuyerArgs> for BuyerProfile {
    fn from(args: BuyerArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone_number: args.phone_number,
            address: args.address,
            city: args.city,
            state: args.state,
            postal_code: args.postal_code,
        }
    }
}

/// Seller shop details.
#[derive(Args, Debug, Clone)]
pub struct SellerArgs {
    #[arg(long)]
    pub shop_name: String,
    #[arg(long, default_value = "")]
    pub bio: String,
    #[arg(long)]
    pub location: String,
    #[arg(long)]
    pub contact_email: String,
    #[arg(long, default_value = "")]
    pub instagram_url: String,
    #[arg(long, default_value = "")]
    pub facebook_url: String,
    #[arg(long, default_value = "")]
    pub pinterest_url: String,
    #[arg(long, env = "ARTISAN_AADHAR_ID", hide_env_values = true)]
    pub aadhar_id: String,
}

impl From<SellerArgs> for SellerProfile {
    fn from(args: SellerArgs) -> Self {
        Self {
            shop_name: args.shop_name,
            bio: args.bio,
            location: args.location,
            contact_email: args.contact_email,
            instagram_url: args.instagram_url,
            facebook_url: args.facebook_url,
            pinterest_url: args.pinterest_url,
            aadhar_id: args.aadhar_id,
        }
    }
}

fn report(status: &FormStatus) -> Result<(), CliError> {
    match status {
        FormStatus::Saved(message) => {
            emit(message);
            Ok(())
        }
        FormStatus::Failed(message) => Err(CliError::InvalidArgument(message.clone())),
        FormStatus::Idle => Ok(()),
    }
}

pub async fn buyer(args: BuyerArgs) -> Result<(), CliError> {
    let app = start_app().await?;
    let mut form = BuyerProfileForm {
        profile: args.into(),
        ..BuyerProfileForm::default()
    };
    let status = form.submit(app.api()).await.clone();
    app.shutdown();
    report(&status)
}

pub async fn seller(args: SellerArgs) -> Result<(), CliError> {
    let app = start_app().await?;
    let mut form = SellerProfileForm {
        profile: args.into(),
        ..SellerProfileForm::default()
    };
    let status = form.submit(app.api()).await.clone();
    app.shutdown();
    report(&status)
}
