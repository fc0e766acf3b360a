//! Product records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Category, Price, ProductId, UserId};

/// A product listed in the catalog.
///
/// Owned by the document store; this type is only ever read and written as a
/// whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub seller_id: Option<UserId>,
    #[serde(default)]
    pub seller_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Units sold so far, used for revenue on the seller dashboard.
    #[serde(default)]
    pub sold: u32,
}

impl Product {
    /// Whether `seller` owns this product.
    #[must_use]
    pub fn is_owned_by(&self, seller: &UserId) -> bool {
        self.seller_id.as_ref() == Some(seller)
    }

    /// The record without its id, as written back to the store.
    #[must_use]
    pub fn to_record(&self) -> NewProduct {
        NewProduct {
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category,
            price: self.price,
            quantity: self.quantity,
            image_url: self.image_url.clone(),
            seller_id: self.seller_id.clone(),
            seller_email: self.seller_email.clone(),
            created_at: self.created_at,
            sold: self.sold,
        }
    }
}

/// A product record without an id, as submitted by the add-item form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: Price,
    pub quantity: u32,
    pub image_url: Option<String>,
    pub seller_id: Option<UserId>,
    pub seller_email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sold: u32,
}

impl NewProduct {
    /// Attach the id assigned by the store.
    #[must_use]
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            category: self.category,
            price: self.price,
            quantity: self.quantity,
            image_url: self.image_url,
            seller_id: self.seller_id,
            seller_email: self.seller_email,
            created_at: self.created_at,
            sold: self.sold,
        }
    }
}
