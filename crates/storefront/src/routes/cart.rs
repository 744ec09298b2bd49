//! Cart route handlers.
//!
//! The order token behind the cart is kept in the shopper's session and
//! never sent to the browser.

use axum::{Json, extract::State};
use serde::Deserialize;
use spree_storefront_core::VariantId;
use tower_sessions::Session;
use tracing::instrument;

use super::ApiResponse;
use crate::checkout::{Notice, SessionTokenStore};
use crate::error::{AppError, Result};
use crate::spree::{LineItem, Order};
use crate::state::AppState;

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub variant_id: VariantId,
    pub quantity: Option<u32>,
}

/// Current cart, or `null` when the shopper has none.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<ApiResponse<Option<Order>>> {
    let store = SessionTokenStore::new(session);
    let order = state.orders().fetch_current_order(&store).await?;
    Ok(ApiResponse::new(order))
}

/// Add a variant to the cart, creating the order on first add.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<ApiResponse<LineItem>> {
    let quantity = request.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }

    let store = SessionTokenStore::new(session);
    let item = state
        .orders()
        .add_line_item(&store, request.variant_id, quantity)
        .await?;

    Ok(ApiResponse::with_notice(item, Notice::cart_updated()))
}

/// Remove a line item from the cart.
#[instrument(skip(state, session, line_item), fields(line_item = %line_item.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(line_item): Json<LineItem>,
) -> Result<ApiResponse<LineItem>> {
    let store = SessionTokenStore::new(session);
    let item = state.orders().remove_line_item(&store, line_item).await?;
    Ok(ApiResponse::with_notice(item, Notice::cart_updated()))
}
