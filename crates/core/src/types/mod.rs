//! Core types for Artisan Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod credential;
pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod status;

pub use category::Category;
pub use credential::Credentials;
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use role::{Role, RoleParseError};
pub use status::OrderStatus;
