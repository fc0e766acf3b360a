//! Product detail page.

use tracing::instrument;

use artisan_backend::{DocumentStore, Query, Snapshot, StoreError};
use artisan_core::ProductId;
use artisan_core::models::{PRODUCTS_COLLECTION, Product};

/// Image shown on the detail page when the product has none.
pub const DETAIL_PLACEHOLDER_IMAGE: &str = "/api/placeholder/400/400";

/// How many similar products to show.
pub const SIMILAR_LIMIT: usize = 10;

/// A product with its neighbours in the same category.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetail {
    pub product: Product,
    pub similar: Vec<Product>,
}

impl ProductDetail {
    #[must_use]
    pub fn image_url(&self) -> &str {
        self.product
            .image_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DETAIL_PLACEHOLDER_IMAGE)
    }
}

/// Load `id` and up to ten other products of the same category.
///
/// A missing product is `Ok(None)`. A failure fetching the similar products
/// only empties that list.
///
/// # Errors
///
/// Returns an error if the product itself cannot be read or decoded.
#[instrument(skip(store), fields(product_id = %id))]
pub async fn load_product(
    store: &dyn DocumentStore,
    id: &ProductId,
) -> Result<Option<ProductDetail>, StoreError> {
    let Some(document) = store.read_one(PRODUCTS_COLLECTION, id.as_str()).await? else {
        tracing::info!("Product not found");
        return Ok(None);
    };
    let product: Product = document.decode()?;

    let query = Query::new()
        .where_eq("category", product.category.slug())
        .excluding_id(id.as_str())
        .limit(SIMILAR_LIMIT);
    let similar = match store.read_query(PRODUCTS_COLLECTION, &query).await {
        Ok(documents) => Snapshot { documents }.decode_all(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load similar products");
            Vec::new()
        }
    };

    Ok(Some(ProductDetail { product, similar }))
}
