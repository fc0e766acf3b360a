//! Records exchanged with the document store and the seller API.
//!
//! Field names follow the stored camelCase JSON, so the same types are used
//! to decode documents, to encode writes, and as HTTP payloads.

pub mod order;
pub mod product;
pub mod profile;
pub mod user;

pub use order::Order;
pub use product::{NewProduct, Product};
pub use profile::{BuyerProfile, ProfileSaved, SellerProfile, ValidationError};
pub use user::UserRecord;

/// Collection holding product documents.
pub const PRODUCTS_COLLECTION: &str = "products";

/// Collection holding one document per user, keyed by uid.
pub const USERS_COLLECTION: &str = "users";

/// Collection holding orders placed against sellers.
pub const ORDERS_COLLECTION: &str = "orders";
