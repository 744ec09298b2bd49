//! Order confirmation after the payment gateway redirects back.
//!
//! The gateway returns the shopper with `?orderReferance=<number>`. The
//! handler polls the order until its shipments are ready or the polling
//! budget runs out, then confirms the checkout either way.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use spree_storefront_core::OrderNumber;
use tower_sessions::Session;
use tracing::instrument;

use super::ApiResponse;
use crate::checkout::{CheckoutFlow, CheckoutStep, Confirmation, SessionTokenStore};
use crate::error::{AppError, Result};
use crate::spree::Order;
use crate::state::AppState;

/// Longest order reference accepted.
const MAX_ORDER_REFERENCE_LEN: usize = 64;

/// Query parameters set by the gateway redirect.
#[derive(Debug, Deserialize)]
pub struct OrderSuccessQuery {
    /// Order number. The parameter name is fixed by the gateway callback.
    #[serde(rename = "orderReferance")]
    pub order_reference: Option<String>,
}

/// Confirmed checkout.
#[derive(Debug, Serialize)]
pub struct OrderSuccessView {
    pub order_number: OrderNumber,
    pub step: CheckoutStep,
    #[serde(flatten)]
    pub confirmation: Confirmation,
    pub order: Option<Order>,
}

/// Parse an order reference, rejecting anything that is not a plain order
/// number.
fn parse_order_reference(reference: &str) -> Option<OrderNumber> {
    let reference = reference.trim();
    let valid = !reference.is_empty()
        && reference.len() <= MAX_ORDER_REFERENCE_LEN
        && reference.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| OrderNumber::new(reference))
}

/// Confirm the order named by `orderReferance`.
///
/// Without a reference the shopper is sent home and nothing is polled.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OrderSuccessQuery>,
) -> Result<Response> {
    let Some(reference) = query
        .order_reference
        .as_deref()
        .filter(|r| !r.trim().is_empty())
    else {
        return Ok(Redirect::to("/").into_response());
    };

    let number = parse_order_reference(reference)
        .ok_or_else(|| AppError::BadRequest("invalid order reference".to_string()))?;

    let store = SessionTokenStore::new(session);
    let mut flow = CheckoutFlow::new(state.orders(), &store);
    let confirmation = flow.await_confirmation(state.poller(), &number).await;
    let machine = flow.into_machine();

    Ok(ApiResponse::new(OrderSuccessView {
        order_number: number,
        step: machine.step(),
        confirmation,
        order: machine.order().cloned(),
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_reference() {
        assert_eq!(
            parse_order_reference("R123456789"),
            Some(OrderNumber::new("R123456789"))
        );
        assert_eq!(
            parse_order_reference(" R1 "),
            Some(OrderNumber::new("R1"))
        );
        assert_eq!(parse_order_reference(""), None);
        assert_eq!(parse_order_reference("R1/../admin"), None);
        assert_eq!(parse_order_reference("R1?x=1"), None);
        assert_eq!(parse_order_reference(&"R".repeat(65)), None);
    }
}
