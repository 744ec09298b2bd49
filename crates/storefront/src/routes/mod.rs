//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                           - Health check
//!
//! # Cart
//! GET  /cart                             - Current order (or null)
//! POST /cart/add                         - Add a variant (creates the order on first add)
//! POST /cart/remove                      - Remove a line item
//!
//! # Checkout
//! POST /checkout/next                    - Advance to the next checkout step
//! PUT  /checkout                         - Update addresses, email, shipping rate
//! GET  /checkout/payment-methods         - Available payment methods
//! POST /checkout/payments                - Record a payment and advance
//! POST /checkout/shipment-availability   - Delivery check for a postal code
//! POST /checkout/payubiz                 - Sign and submit a PayU payment
//! GET  /checkout/order-success           - Confirm after the gateway redirect
//!
//! # Auth
//! GET  /auth/authorized                  - Is the shopper signed in?
//! POST /auth/social                      - Social login
//! POST /auth/logout                      - Sign out
//! ```
//!
//! Successful JSON responses share one envelope: `{"data": .., "notice": ..}`.
//! `notice` is present when the shopper should see a toast.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod order_success;

use axum::{
    Json, Router,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::checkout::Notice;
use crate::state::AppState;

/// JSON envelope for successful responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl<T> ApiResponse<T> {
    /// Response without a notice.
    pub const fn new(data: T) -> Self {
        Self { data, notice: None }
    }

    /// Response carrying a notice for the shopper.
    pub const fn with_notice(data: T, notice: Notice) -> Self {
        Self {
            data,
            notice: Some(notice),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::put(checkout::update))
        .route("/next", post(checkout::next))
        .route("/payment-methods", get(checkout::payment_methods))
        .route("/payments", post(checkout::create_payment))
        .route(
            "/shipment-availability",
            post(checkout::shipment_availability),
        )
        .route("/payubiz", post(checkout::payubiz))
        .route("/order-success", get(order_success::show))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/authorized", get(auth::authorized))
        .route("/social", post(auth::social_login))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/auth", auth_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
