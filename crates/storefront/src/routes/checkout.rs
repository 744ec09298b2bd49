//! Checkout route handlers.
//!
//! Each handler builds a fresh [`CheckoutFlow`] over the shopper's session and
//! reports the step Spree put the order in. Nothing about the flow outlives
//! the request, so Spree alone decides whether a completed order may move.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use spree_storefront_core::{Money, PaymentMethodId};
use tower_sessions::Session;
use tracing::instrument;

use super::ApiResponse;
use crate::checkout::{
    CheckoutError, CheckoutFlow, CheckoutStep, OrderTokenStore, PaymentInput, SessionTokenStore,
};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::spree::{CheckoutUpdate, Order, PaymentMethod, ShipmentAvailability};
use crate::state::AppState;

/// Step and order after a checkout call.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub order: Option<Order>,
}

impl<S: OrderTokenStore> From<CheckoutFlow<'_, S>> for CheckoutView {
    fn from(flow: CheckoutFlow<'_, S>) -> Self {
        let machine = flow.into_machine();
        Self {
            step: machine.step(),
            order: machine.order().cloned(),
        }
    }
}

/// Create payment request body.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub payment_method_id: PaymentMethodId,
    pub amount: Money,
}

/// Shipment availability request body.
#[derive(Debug, Deserialize)]
pub struct ShipmentAvailabilityRequest {
    pub pincode: u32,
}

/// Gateway bridge answer for a submitted payment.
#[derive(Debug, Serialize)]
pub struct PaymentSubmission {
    pub txnid: String,
    pub gateway: serde_json::Value,
}

/// Move the current order to its next checkout step.
#[instrument(skip(state, session))]
pub async fn next(
    State(state): State<AppState>,
    session: Session,
) -> Result<ApiResponse<CheckoutView>> {
    let store = SessionTokenStore::new(session);
    let mut flow = CheckoutFlow::new(state.orders(), &store);
    flow.advance().await?;
    Ok(ApiResponse::new(flow.into()))
}

/// Update addresses, email or shipping rate on the current order.
#[instrument(skip(state, session, update))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(update): Json<CheckoutUpdate>,
) -> Result<ApiResponse<CheckoutView>> {
    let store = SessionTokenStore::new(session);
    let mut flow = CheckoutFlow::new(state.orders(), &store);
    flow.update(&update).await?;
    Ok(ApiResponse::new(flow.into()))
}

/// Payment methods available for the current order.
#[instrument(skip(state, session))]
pub async fn payment_methods(
    State(state): State<AppState>,
    session: Session,
) -> Result<ApiResponse<Vec<PaymentMethod>>> {
    let store = SessionTokenStore::new(session);
    let methods = state.orders().available_payment_methods(&store).await?;
    Ok(ApiResponse::new(methods))
}

/// Record a payment on the current order and advance.
#[instrument(skip(state, session))]
pub async fn create_payment(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<ApiResponse<CheckoutView>> {
    let store = SessionTokenStore::new(session);
    let mut flow = CheckoutFlow::new(state.orders(), &store);
    flow.pay(request.payment_method_id, request.amount).await?;
    Ok(ApiResponse::new(flow.into()))
}

/// Whether the store delivers to a postal code.
#[instrument(skip(state))]
pub async fn shipment_availability(
    State(state): State<AppState>,
    Json(request): Json<ShipmentAvailabilityRequest>,
) -> Result<ApiResponse<ShipmentAvailability>> {
    let availability = state
        .orders()
        .shipment_availability(request.pincode)
        .await?;
    Ok(ApiResponse::new(availability))
}

/// Sign a `PayU` payment for the current order and hand it to the gateway
/// bridge.
#[instrument(skip(state, session, user))]
pub async fn payubiz(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
) -> Result<ApiResponse<PaymentSubmission>> {
    let store = SessionTokenStore::new(session);
    let order = state
        .orders()
        .fetch_current_order(&store)
        .await?
        .ok_or(CheckoutError::NoCurrentOrder)?;
    let billing = order
        .bill_address
        .as_ref()
        .ok_or_else(|| CheckoutError::MissingBillingAddress(order.number.clone()))?;

    let request = state.payments().build(&PaymentInput {
        order_number: &order.number,
        amount: order.total,
        billing,
        email: &user.email,
    })?;
    add_breadcrumb(
        "checkout",
        "Payment submitted",
        Some(&[("order", order.number.as_str()), ("txnid", request.txnid.as_str())]),
    );

    let gateway = state.orders().submit_payment(&request).await?;
    Ok(ApiResponse::new(PaymentSubmission {
        txnid: request.txnid,
        gateway,
    }))
}
