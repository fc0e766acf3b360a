//! Product catalog.
//!
//! A live view over the `products` collection: every snapshot the store
//! delivers replaces the product list, and the visible cards are derived
//! from it with the current category filter, search term and sort order.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use artisan_backend::{DocumentStore, Snapshot, Subscription};
use artisan_core::models::{PRODUCTS_COLLECTION, Product};
use artisan_core::{Category, ProductId};

/// Image shown for products without one.
pub const PLACEHOLDER_IMAGE: &str = "/api/placeholder/300/300";

/// Card titles are cut to this many characters.
pub const NAME_LIMIT: usize = 15;

/// Card descriptions are cut to this many characters.
pub const DESCRIPTION_LIMIT: usize = 90;

/// Cut `text` to `limit` characters, marking the cut with `...`.
#[must_use]
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let head: String = text.chars().take(limit).collect();
    format!("{head}...")
}

// =============================================================================
// Filtering and Sorting
// =============================================================================

/// Category selection of the filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    #[must_use]
    pub fn matches(self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => product.category == category,
        }
    }

    /// Value used in links and on the command line.
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(category) => category.slug(),
        }
    }

    /// Button label.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::All => "All".to_string(),
            Self::Only(category) => category.label(),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.parse::<Category>().map(Self::Only)
    }
}

/// `all` followed by each category present in `products`, in order of first
/// appearance.
#[must_use]
pub fn category_options(products: &[Product]) -> Vec<CategoryFilter> {
    let mut options = vec![CategoryFilter::All];
    for product in products {
        let option = CategoryFilter::Only(product.category);
        if !options.contains(&option) {
            options.push(option);
        }
    }
    options
}

/// Case-insensitive match on name or description. A blank term matches
/// everything.
#[must_use]
pub fn matches_search(product: &Product, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty()
        || product.name.to_lowercase().contains(&term)
        || product.description.to_lowercase().contains(&term)
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recently created first.
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "priceAsc",
            Self::PriceDesc => "priceDesc",
            Self::Name => "name",
        }
    }

    /// Sort `products` in place. Products without a creation time count as
    /// created at `now`.
    pub fn sort(self, products: &mut [Product], now: DateTime<Utc>) {
        match self {
            Self::Newest => {
                products.sort_by_key(|p| std::cmp::Reverse(p.created_at.unwrap_or(now)));
            }
            Self::PriceAsc => products.sort_by_key(|p| p.price),
            Self::PriceDesc => products.sort_by_key(|p| std::cmp::Reverse(p.price)),
            Self::Name => products.sort_by_cached_key(|p| p.name.to_lowercase()),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "priceAsc" => Ok(Self::PriceAsc),
            "priceDesc" => Ok(Self::PriceDesc),
            "name" => Ok(Self::Name),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

// =============================================================================
// Cards
// =============================================================================

/// Display data for one product tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub image_url: String,
    pub in_stock: bool,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: truncate(&product.name, NAME_LIMIT),
            description: truncate(&product.description, DESCRIPTION_LIMIT),
            category: product.category.label(),
            price: product.price.display(),
            image_url: product
                .image_url
                .clone()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            in_stock: product.quantity > 0,
        }
    }
}

// =============================================================================
// Live View
// =============================================================================

/// The mounted catalog page.
///
/// Holds the live subscription; [`CatalogView::unmount`] (or dropping the
/// view) cancels it and no further snapshots are applied.
#[derive(Debug)]
pub struct CatalogView {
    subscription: Option<Subscription<Snapshot>>,
    products: Vec<Product>,
    pub filter: CategoryFilter,
    pub search: String,
    pub sort: SortOrder,
}

impl CatalogView {
    /// Subscribe to the products collection.
    #[must_use]
    pub fn mount(store: &dyn DocumentStore) -> Self {
        Self {
            subscription: Some(store.subscribe(PRODUCTS_COLLECTION)),
            products: Vec::new(),
            filter: CategoryFilter::All,
            search: String::new(),
            sort: SortOrder::Newest,
        }
    }

    fn apply(&mut self, snapshot: &Snapshot) {
        self.products = snapshot.decode_all();
        tracing::debug!(count = self.products.len(), "Catalog snapshot applied");
    }

    /// Wait for the next snapshot and apply it.
    ///
    /// Returns `false` once the view is unmounted or the store stops sending.
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

    /// Apply every snapshot already queued. Returns whether anything changed.
    pub fn try_update(&mut self) -> bool {
        let mut latest = None;
        if let Some(subscription) = self.subscription.as_mut() {
            while let Some(snapshot) = subscription.try_next() {
                latest = Some(snapshot);
            }
        }
        latest.is_some_and(|snapshot| {
            self.apply(&snapshot);
            true
        })
    }

    /// Cancel the subscription. The last product list stays readable.
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn categories(&self) -> Vec<CategoryFilter> {
        category_options(&self.products)
    }

    /// Cards for the products passing the filter and search, in sort order.
    #[must_use]
    pub fn visible(&self) -> Vec<ProductCard> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|p| self.filter.matches(p) && matches_search(p, &self.search))
            .cloned()
            .collect();
        self.sort.sort(&mut products, Utc::now());
        products.iter().map(ProductCard::from).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use artisan_backend::memory::MemoryStore;
    use artisan_core::Price;

    use super::*;

    fn product(id: &str, name: &str, category: Category, price: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: format!("{name} made by hand"),
            category,
            price: Price::new(price.into()).unwrap(),
            quantity: 3,
            image_url: None,
            seller_id: None,
            seller_email: None,
            created_at: None,
            sold: 0,
        }
    }

    fn record(name: &str, category: &str, price: f64) -> artisan_backend::Fields {
        serde_json::json!({ "name": name, "category": category, "price": price, "quantity": 1 })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("Short", 15), "Short");
        assert_eq!(truncate("Handwoven Jute Basket", 15), "Handwoven Jute ...");
        assert_eq!(truncate("मिट्टी का दीया और थाली", 5).chars().count(), 8);
    }

    #[test]
    fn test_card_uses_placeholder_and_limits() {
        let mut p = product("p1", "Blue Pottery Vase Large", Category::Pottery, 1200);
        p.description = "x".repeat(120);
        let card = ProductCard::from(&p);

        assert_eq!(card.name, "Blue Pottery Va...");
        assert_eq!(card.description.len(), DESCRIPTION_LIMIT + 3);
        assert_eq!(card.image_url, PLACEHOLDER_IMAGE);
        assert_eq!(card.category, "Pottery");
        assert_eq!(card.price, "₹1,200.00");
    }

    #[test]
    fn test_category_options_keep_first_appearance() {
        let products = vec![
            product("1", "a", Category::Textile, 1),
            product("2", "b", Category::Pottery, 1),
            product("3", "c", Category::Textile, 1),
        ];
        let options = category_options(&products);
        let labels: Vec<String> = options.iter().map(|o| o.label()).collect();
        assert_eq!(labels, ["All", "Textile", "Pottery"]);
        assert_eq!(options[0].value(), "all");
    }

    #[test]
    fn test_sort_orders() {
        let now = Utc::now();
        let mut older = product("old", "Zari shawl", Category::Textile, 300);
        older.created_at = Some(now - chrono::Duration::days(2));
        let undated = product("new", "bamboo tray", Category::Basketry, 100);
        let mut products = vec![older, undated];

        SortOrder::Newest.sort(&mut products, now);
        assert_eq!(products[0].id.as_str(), "new");

        SortOrder::PriceDesc.sort(&mut products, now);
        assert_eq!(products[0].id.as_str(), "old");

        SortOrder::Name.sort(&mut products, now);
        assert_eq!(products[0].name, "bamboo tray");

        assert_eq!("priceAsc".parse::<SortOrder>(), Ok(SortOrder::PriceAsc));
        assert!("cheapest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let p = product("1", "Brass Lamp", Category::Metalwork, 10);
        assert!(matches_search(&p, "brass"));
        assert!(matches_search(&p, "MADE BY"));
        assert!(matches_search(&p, "  "));
        assert!(!matches_search(&p, "wood"));
    }

    #[tokio::test]
    async fn test_live_view_follows_store() {
        let store = MemoryStore::default();
        store.insert("products", "p1", record("Clay cup", "pottery", 150.0));
        let mut view = CatalogView::mount(&store);

        assert!(view.next_update().await);
        assert_eq!(view.products().len(), 1);

        store
            .add("products", record("Silk stole", "textile", 900.0))
            .await
            .unwrap();
        assert!(view.next_update().await);
        assert_eq!(view.visible().len(), 2);

        view.filter = "textile".parse().unwrap();
        let cards = view.visible();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "Silk stole");
    }

    #[tokio::test]
    async fn test_unmounted_view_ignores_updates() {
        let store = MemoryStore::default();
        let mut view = CatalogView::mount(&store);
        assert!(view.next_update().await);

        view.unmount();
        store.insert("products", "p1", record("Clay cup", "pottery", 150.0));

        assert!(!view.is_mounted());
        assert!(!view.try_update());
        assert!(!view.next_update().await);
        assert!(view.products().is_empty());
    }
}
