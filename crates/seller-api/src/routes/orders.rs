//! Seller order routes.

use axum::{
    Json,
    extract::{Query as QueryParams, State},
};
use serde::Deserialize;
use tracing::instrument;

use artisan_backend::{Query, Snapshot};
use artisan_core::OrderStatus;
use artisan_core::models::{ORDERS_COLLECTION, Order};

use crate::error::Result;
use crate::middleware::Caller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrdersParams {
    status: Option<OrderStatus>,
}

/// `GET /api/seller/orders?status=`
///
/// Scoped to the caller when a bearer token is presented. An unknown status
/// is rejected by the query extractor with 400.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Caller(caller): Caller,
    QueryParams(params): QueryParams<OrdersParams>,
) -> Result<Json<Vec<Order>>> {
    let mut query = Query::new();
    if let Some(uid) = &caller {
        query = query.where_eq("sellerId", uid.as_str());
    }
    if let Some(status) = params.status {
        query = query.where_eq("status", status.as_str());
    }

    let documents = state.store().read_query(ORDERS_COLLECTION, &query).await?;
    let orders: Vec<Order> = Snapshot { documents }.decode_all();

    tracing::debug!(count = orders.len(), status = ?params.status, "Listed seller orders");
    Ok(Json(orders))
}
