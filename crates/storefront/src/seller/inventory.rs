//! Seller inventory ("My Products").

use chrono::Utc;
use tracing::instrument;

use artisan_backend::{DocumentStore, Snapshot, Subscription};
use artisan_core::models::{PRODUCTS_COLLECTION, Product};
use artisan_core::{ProductId, UserId};

use super::require_identity;
use crate::api::LocalApiClient;
use crate::catalog::{CategoryFilter, SortOrder, category_options, matches_search};
use crate::error::{AppError, Result};
use crate::session::Session;

/// The seller's products plus the list controls.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    items: Vec<Product>,
    pub search: String,
    pub filter: CategoryFilter,
    pub sort: SortOrder,
}

impl Inventory {
    #[must_use]
    pub fn from_items(items: Vec<Product>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Fetch the seller's items from the seller API.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the request fails.
    pub async fn load(api: &LocalApiClient) -> Result<Self> {
        Ok(Self::from_items(api.seller_items().await?))
    }

    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn replace_items(&mut self, items: Vec<Product>) {
        self.items = items;
    }

    #[must_use]
    pub fn categories(&self) -> Vec<CategoryFilter> {
        category_options(&self.items)
    }

    /// Items passing the search and category filter, in sort order.
    #[must_use]
    pub fn visible(&self) -> Vec<Product> {
        let mut items: Vec<Product> = self
            .items
            .iter()
            .filter(|p| self.filter.matches(p) && matches_search(p, &self.search))
            .cloned()
            .collect();
        self.sort.sort(&mut items, Utc::now());
        items
    }

    /// Delete an item, removing it from the list before the request.
    ///
    /// The item goes back to its old position if the request fails. An item
    /// the API no longer knows about stays removed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item is not in the list, or `Api` if the
    /// request fails.
    #[instrument(skip(self, api), fields(product_id = %id))]
    pub async fn delete(&mut self, api: &LocalApiClient, id: &ProductId) -> Result<()> {
        let index = self
            .items
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        let removed = self.items.remove(index);

        match api.delete_seller_item(id).await {
            Ok(()) => {
                tracing::info!("Item deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("Item was already gone");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Delete failed, restoring item");
                self.items.insert(index.min(self.items.len()), removed);
                Err(e.into())
            }
        }
    }
}

/// Inventory kept current by a subscription to the products collection.
#[derive(Debug)]
pub struct LiveInventory {
    seller: UserId,
    subscription: Option<Subscription<Snapshot>>,
    inventory: Inventory,
}

impl LiveInventory {
    /// Subscribe to the signed-in seller's products.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without an identity.
    pub fn mount(store: &dyn DocumentStore, session: &Session) -> Result<Self> {
        let seller = require_identity(session)?.uid.clone();
        Ok(Self {
            seller,
            subscription: Some(store.subscribe(PRODUCTS_COLLECTION)),
            inventory: Inventory::default(),
        })
    }

    fn apply(&mut self, snapshot: &Snapshot) {
        let items: Vec<Product> = snapshot
            .decode_all::<Product>()
            .into_iter()
            .filter(|p| p.is_owned_by(&self.seller))
            .collect();
        tracing::debug!(seller = %self.seller, count = items.len(), "Inventory snapshot applied");
        self.inventory.replace_items(items);
    }

    /// Wait for the next snapshot. Returns `false` once unmounted.
    pub async fn next_update(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        match subscription.next().await {
            Some(snapshot) => {
                self.apply(&snapshot);
                true
            }
            None => false,
        }
    }

    pub fn unmount(&mut self) {
        self.subscription = None;
    }

    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub const fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }
}
