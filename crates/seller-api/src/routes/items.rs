//! Seller item routes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use artisan_backend::{Query, Snapshot};
use artisan_core::ProductId;
use artisan_core::models::{PRODUCTS_COLLECTION, Product};

use crate::error::{AppError, Result};
use crate::middleware::Caller;
use crate::state::AppState;

/// `GET /api/seller/items`
///
/// With a bearer token, only the caller's items; otherwise every item.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>, Caller(caller): Caller) -> Result<Json<Vec<Product>>> {
    let query = caller
        .as_ref()
        .map_or_else(Query::new, |uid| Query::new().where_eq("sellerId", uid.as_str()));

    let documents = state.store().read_query(PRODUCTS_COLLECTION, &query).await?;
    let items: Vec<Product> = Snapshot { documents }.decode_all();

    tracing::debug!(count = items.len(), scoped = caller.is_some(), "Listed seller items");
    Ok(Json(items))
}

/// `DELETE /api/seller/items/{id}`
#[instrument(skip(state), fields(product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    let doc = state
        .store()
        .read_one(PRODUCTS_COLLECTION, id.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;

    if let Some(uid) = &caller {
        let product: Product = doc.decode()?;
        if !product.is_owned_by(uid) {
            tracing::warn!(uid = %uid, "Refused delete of another seller's item");
            return Err(AppError::Forbidden("You can only delete your own items".to_string()));
        }
    }

    state.store().delete_one(PRODUCTS_COLLECTION, id.as_str()).await?;
    tracing::info!(uid = ?caller, "Deleted seller item");
    Ok(StatusCode::NO_CONTENT)
}
