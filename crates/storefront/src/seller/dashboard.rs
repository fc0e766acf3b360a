//! Seller dashboard metrics.
//!
//! Each section loads independently; a failed request leaves its section
//! empty and is listed in [`Dashboard::problems`] instead of failing the
//! whole page.

use chrono::{DateTime, Duration, Utc};
use tracing::instrument;

use artisan_core::models::{Order, Product};
use artisan_core::types::category::capitalize;
use artisan_core::{OrderId, OrderStatus, Price};

use super::require_identity;
use crate::api::{ApiError, LocalApiClient};
use crate::error::Result;
use crate::session::Session;

/// Products shown in the inventory preview.
pub const PREVIEW_COUNT: usize = 3;

/// Rows in the recent sales table.
pub const RECENT_SALES_COUNT: usize = 5;

/// One row of the recent sales table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRow {
    pub id: OrderId,
    pub product: String,
    pub date: String,
    pub amount: String,
    pub status: String,
}

impl SaleRow {
    fn new(order: &Order, now: DateTime<Utc>) -> Self {
        Self {
            id: order.id.clone(),
            product: order.product_name.clone(),
            date: order
                .created_at
                .map_or_else(|| "Unknown".to_string(), |at| relative_date(at, now)),
            amount: order.amount.display(),
            status: capitalize(order.status.as_str()),
        }
    }
}

/// `Today, 2:30 PM`, `Yesterday`, or `05 Mar 2025`.
fn relative_date(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let day = at.date_naive();
    if day == now.date_naive() {
        at.format("Today, %-I:%M %p").to_string()
    } else if Some(day) == now.date_naive().checked_sub_signed(Duration::days(1)) {
        "Yesterday".to_string()
    } else {
        at.format("%d %b %Y").to_string()
    }
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub greeting: String,
    /// `None` while unknown (the items request failed).
    pub total_products: Option<usize>,
    pub pending_orders: Option<usize>,
    /// Sum of price times units sold over all products.
    pub monthly_revenue: Price,
    pub preview: Vec<Product>,
    pub recent_sales: Vec<SaleRow>,
    pub problems: Vec<String>,
}

impl Dashboard {
    /// Build the dashboard from the three section results.
    #[must_use]
    pub fn assemble(
        email: Option<&str>,
        items: std::result::Result<Vec<Product>, ApiError>,
        pending: std::result::Result<Vec<Order>, ApiError>,
        orders: std::result::Result<Vec<Order>, ApiError>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut problems = Vec::new();

        let items = items
            .inspect_err(|e| {
                tracing::warn!(error = %e, "Failed to fetch products");
                problems.push("Could not load your products".to_string());
            })
            .ok();
        let pending = pending
            .inspect_err(|e| {
                tracing::warn!(error = %e, "Failed to fetch pending orders");
                problems.push("Could not load pending orders".to_string());
            })
            .ok();
        let mut orders = orders
            .inspect_err(|e| {
                tracing::warn!(error = %e, "Failed to fetch orders");
                problems.push("Could not load recent sales".to_string());
            })
            .unwrap_or_default();

        orders.sort_by_key(|order| std::cmp::Reverse(order.created_at));
        let recent_sales = orders
            .iter()
            .take(RECENT_SALES_COUNT)
            .map(|order| SaleRow::new(order, now))
            .collect();

        let monthly_revenue = items
            .iter()
            .flatten()
            .map(|p| p.price.times(p.sold))
            .sum();

        Self {
            greeting: format!("Welcome back, {}", email.unwrap_or("Seller")),
            total_products: items.as_ref().map(Vec::len),
            pending_orders: pending.as_ref().map(Vec::len),
            monthly_revenue,
            preview: items
                .unwrap_or_default()
                .into_iter()
                .take(PREVIEW_COUNT)
                .collect(),
            recent_sales,
            problems,
        }
    }
}

/// Load the dashboard for the signed-in seller.
///
/// # Errors
///
/// Returns `NotSignedIn` without an identity. Request failures are reported
/// in [`Dashboard::problems`].
#[instrument(skip(api, session))]
pub async fn load_dashboard(api: &LocalApiClient, session: &Session) -> Result<Dashboard> {
    let identity = require_identity(session)?;
    let (items, pending, orders) = tokio::join!(
        api.seller_items(),
        api.seller_orders(Some(OrderStatus::Pending)),
        api.seller_orders(None),
    );
    Ok(Dashboard::assemble(
        identity.email.as_ref().map(artisan_core::Email::as_str),
        items,
        pending,
        orders,
        Utc::now(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str, price: u32, sold: u32) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id, "name": id, "price": price, "sold": sold,
        }))
        .unwrap()
    }

    fn order(id: &str, status: &str, at: DateTime<Utc>) -> Order {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "sellerId": "s1",
            "productName": format!("Item {id}"),
            "amount": 1299,
            "status": status,
            "createdAt": at,
        }))
        .unwrap()
    }

    fn failure() -> ApiError {
        ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_metrics() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap();
        let items = vec![
            product("a", 100, 2),
            product("b", 50, 0),
            product("c", 10, 5),
            product("d", 1, 1),
        ];
        let pending = vec![order("o1", "pending", now)];
        let orders = vec![
            order("o0", "completed", now - Duration::days(3)),
            order("o1", "pending", now - Duration::hours(1)),
            order("o2", "processing", now - Duration::days(1)),
        ];

        let dashboard = Dashboard::assemble(
            Some("maker@example.com"),
            Ok(items),
            Ok(pending),
            Ok(orders),
            now,
        );

        assert_eq!(dashboard.greeting, "Welcome back, maker@example.com");
        assert_eq!(dashboard.total_products, Some(4));
        assert_eq!(dashboard.pending_orders, Some(1));
        assert_eq!(dashboard.monthly_revenue.amount(), Decimal::from(251));
        assert_eq!(dashboard.preview.len(), PREVIEW_COUNT);

        let sales: Vec<(&str, &str, &str)> = dashboard
            .recent_sales
            .iter()
            .map(|s| (s.id.as_str(), s.date.as_str(), s.status.as_str()))
            .collect();
        assert_eq!(
            sales,
            [
                ("o1", "Today, 2:00 PM", "Pending"),
                ("o2", "Yesterday", "Processing"),
                ("o0", "07 Mar 2025", "Completed"),
            ]
        );
        assert_eq!(dashboard.recent_sales[0].amount, "₹1,299.00");
        assert!(dashboard.problems.is_empty());
    }

    #[test]
    fn test_failed_sections_are_reported() {
        let dashboard =
            Dashboard::assemble(None, Err(failure()), Ok(vec![]), Err(failure()), Utc::now());

        assert_eq!(dashboard.greeting, "Welcome back, Seller");
        assert_eq!(dashboard.total_products, None);
        assert_eq!(dashboard.pending_orders, Some(0));
        assert_eq!(dashboard.monthly_revenue, Price::ZERO);
        assert_eq!(dashboard.problems.len(), 2);
    }

    #[test]
    fn test_revenue_saturates_on_huge_prices() {
        let huge: Product = serde_json::from_value(serde_json::json!({
            "id": "big", "name": "big", "price": "70000000000000000000000000000", "sold": 2,
        }))
        .unwrap();
        let items = vec![huge, product("a", 100, 2)];

        let dashboard = Dashboard::assemble(None, Ok(items), Ok(vec![]), Ok(vec![]), Utc::now());

        assert_eq!(dashboard.monthly_revenue.amount(), Decimal::MAX);
        assert!(dashboard.problems.is_empty());
    }
}
