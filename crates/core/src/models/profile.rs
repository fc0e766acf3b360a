//! Buyer and seller profile forms.
//!
//! Both the storefront (before posting) and the seller API (on receipt)
//! validate with the same rules.

use serde::{Deserialize, Serialize};

use crate::types::{Email, ProfileId};

/// A profile failed validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields were left blank.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A field is present but malformed.
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Collect the names of required fields that are blank.
fn missing(fields: &[(&'static str, &str)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect()
}

fn check_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    Email::parse(value)
        .map(|_| ())
        .map_err(|e| ValidationError::Invalid {
            field,
            reason: e.to_string(),
        })
}

/// Shipping details saved from the buyer profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuyerProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl BuyerProfile {
    /// Check required fields and the email format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] listing every blank required
    /// field, or [`ValidationError::Invalid`] for a malformed email.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let blank = missing(&[
            ("firstName", self.first_name.as_str()),
            ("email", self.email.as_str()),
            ("address", self.address.as_str()),
            ("city", self.city.as_str()),
            ("postalCode", self.postal_code.as_str()),
        ]);
        if !blank.is_empty() {
            return Err(ValidationError::MissingFields(blank));
        }
        check_email("email", self.email.as_str())
    }
}

/// Shop details saved from the seller profile page.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SellerProfile {
    pub shop_name: String,
    pub bio: String,
    pub location: String,
    pub contact_email: String,
    pub instagram_url: String,
    pub facebook_url: String,
    pub pinterest_url: String,
    /// National identity number. Never logged.
    pub aadhar_id: String,
}

impl SellerProfile {
    /// Check required fields and the contact email format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] listing every blank required
    /// field, or [`ValidationError::Invalid`] for a malformed contact email.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let blank = missing(&[
            ("shopName", self.shop_name.as_str()),
            ("location", self.location.as_str()),
            ("contactEmail", self.contact_email.as_str()),
            ("aadharId", self.aadhar_id.as_str()),
        ]);
        if !blank.is_empty() {
            return Err(ValidationError::MissingFields(blank));
        }
        check_email("contactEmail", self.contact_email.as_str())
    }
}

/// Response body of a successful profile save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSaved {
    pub id: ProfileId,
    pub message: String,
}

impl std::fmt::Debug for SellerProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SellerProfile")
            .field("shop_name", &self.shop_name)
            .field("bio", &self.bio)
            .field("location", &self.location)
            .field("contact_email", &self.contact_email)
            .field("instagram_url", &self.instagram_url)
            .field("facebook_url", &self.facebook_url)
            .field("pinterest_url", &self.pinterest_url)
            .field("aadhar_id", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buyer() -> BuyerProfile {
        BuyerProfile {
            first_name: "Asha".to_string(),
            email: "asha@example.in".to_string(),
            address: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            postal_code: "411001".to_string(),
            ..BuyerProfile::default()
        }
    }

    fn seller() -> SellerProfile {
        SellerProfile {
            shop_name: "Clay Corner".to_string(),
            location: "Jaipur".to_string(),
            contact_email: "shop@claycorner.in".to_string(),
            aadhar_id: "123412341234".to_string(),
            ..SellerProfile::default()
        }
    }

    #[test]
    fn test_buyer_profile_valid() {
        assert_eq!(buyer().validate(), Ok(()));
    }

    #[test]
    fn test_buyer_profile_lists_all_missing_fields() {
        let profile = BuyerProfile {
            city: "  ".to_string(),
            postal_code: String::new(),
            ..buyer()
        };
        assert_eq!(
            profile.validate(),
            Err(ValidationError::MissingFields(vec!["city", "postalCode"]))
        );
    }

    #[test]
    fn test_seller_profile_rejects_bad_email() {
        let profile = SellerProfile {
            contact_email: "shop-at-claycorner".to_string(),
            ..seller()
        };
        assert!(matches!(
            profile.validate(),
            Err(ValidationError::Invalid {
                field: "contactEmail",
                ..
            })
        ));
    }

    #[test]
    fn test_seller_profile_requires_aadhar() {
        let profile = SellerProfile {
            aadhar_id: String::new(),
            ..seller()
        };
        assert_eq!(
            profile.validate(),
            Err(ValidationError::MissingFields(vec!["aadharId"]))
        );
    }

    #[test]
    fn test_seller_profile_debug_redacts_aadhar() {
        let debug = format!("{:?}", seller());
        assert!(debug.contains("Clay Corner"));
        assert!(!debug.contains("123412341234"));
    }

    #[test]
    fn test_profiles_use_camel_case_json() {
        let json = serde_json::to_value(seller()).unwrap_or_default();
        assert_eq!(json["shopName"], "Clay Corner");
        assert_eq!(json["aadharId"], "123412341234");
    }
}
