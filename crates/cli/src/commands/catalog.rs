//! Catalog, product detail and cart commands.

use artisan_core::ProductId;
use artisan_core::models::Product;
use artisan_storefront::AppError;
use artisan_storefront::cart::Cart;
use artisan_storefront::catalog::{CatalogView, CategoryFilter, ProductCard, SortOrder};
use artisan_storefront::product::load_product;

use super::{CliError, emit, start_app};

fn parse_filter(category: &str) -> Result<CategoryFilter, CliError> {
    category.parse().map_err(CliError::InvalidArgument)
}

fn parse_sort(sort: &str) -> Result<SortOrder, CliError> {
    sort.parse().map_err(CliError::InvalidArgument)
}

fn card_line(card: &ProductCard) -> String {
    let stock = if card.in_stock { "" } else { "  (out of stock)" };
    format!(
        "{:<16} {:>12}  {:<12} {}{stock}",
        card.name, card.price, card.category, card.id
    )
}

/// Print the catalog's first snapshot as cards.
pub async fn list(category: &str, search: &str, sort: &str) -> Result<(), CliError> {
    let filter = parse_filter(category)?;
    let sort = parse_sort(sort)?;
    let app = start_app().await?;

    let mut view = CatalogView::mount(app.backend().store.as_ref());
    view.filter = filter;
    view.search = search.to_string();
    view.sort = sort;
    view.next_update().await;
    view.unmount();

    let labels: Vec<String> = view.categories().into_iter().map(CategoryFilter::label).collect();
    emit(format!("Categories: {}", labels.join(", ")));

    let cards = view.visible();
    if cards.is_empty() {
        emit("No products found");
    }
    for card in &cards {
        emit(card_line(card));
    }

    app.shutdown();
    Ok(())
}

/// Print one product and its similar products.
pub async fn show(id: &str) -> Result<(), CliError> {
    let app = start_app().await?;
    let detail = load_product(app.backend().store.as_ref(), &ProductId::new(id))
        .await
        .map_err(AppError::from)?;
    app.shutdown();

    let Some(detail) = detail else {
        emit("Product not found");
        return Ok(());
    };

    let product = &detail.product;
    emit(&product.name);
    emit(format!("{}  |  {}", product.price.display(), product.category.label()));
    if !product.description.is_empty() {
        emit(&product.description);
    }
    emit(format!("Image: {}", detail.image_url()));
    emit(format!("In stock: {}", product.quantity));

    if !detail.similar.is_empty() {
        emit("");
        emit("Similar products:");
        for similar in &detail.similar {
            emit(card_line(&ProductCard::from(similar)));
        }
    }
    Ok(())
}

/// Add the given products to a fresh cart and print it.
pub async fn cart(ids: &[String]) -> Result<(), CliError> {
    let app = start_app().await?;
    let store = app.backend().store.as_ref();

    let mut cart = Cart::new();
    for id in ids {
        match load_product(store, &ProductId::new(id.as_str())).await {
            Ok(Some(detail)) => cart.add(&detail.product),
            Ok(None) => tracing::warn!(product_id = %id, "Skipping unknown product"),
            Err(e) => {
                app.shutdown();
                return Err(AppError::from(e).into());
            }
        }
    }
    app.shutdown();

    if cart.is_empty() {
        emit("Your cart is empty");
        return Ok(());
    }
    for line in cart.lines() {
        let product: &Product = &line.product;
        emit(format!(
            "{} x {:<20} {:>12}",
            line.quantity,
            product.name,
            line.line_total().display()
        ));
    }
    emit(format!(
        "{} item(s), subtotal {}",
        cart.item_count(),
        cart.subtotal().display()
    ));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_filter("all").unwrap(), CategoryFilter::All);
        assert!(parse_filter("spaceships").is_err());
        assert_eq!(parse_sort("priceDesc").unwrap(), SortOrder::PriceDesc);
        assert!(matches!(parse_sort("cheapest"), Err(CliError::InvalidArgument(_))));
    }
}
