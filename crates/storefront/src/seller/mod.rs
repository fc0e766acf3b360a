//! Seller console.
//!
//! Every view here sits behind the seller role in the route table. The
//! operations still check for a signed-in identity themselves because they
//! need the uid to scope reads and writes.

pub mod add_item;
pub mod dashboard;
pub mod inventory;

pub use add_item::{ImageFile, ItemForm, ValidItem, add_item, load_for_edit, update_item};
pub use dashboard::{Dashboard, load_dashboard};
pub use inventory::{Inventory, LiveInventory};

use artisan_backend::Identity;

use crate::error::AppError;
use crate::session::Session;

/// The signed-in identity, or `NotSignedIn`.
pub(crate) fn require_identity(session: &Session) -> Result<&Identity, AppError> {
    session.identity.as_ref().ok_or(AppError::NotSignedIn)
}
