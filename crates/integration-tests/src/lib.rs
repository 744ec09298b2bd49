//! Integration tests for the Spree storefront.
//!
//! Spree is replaced by an `httpmock` server; the storefront runs in-process
//! (services directly, or the full router via `tower::ServiceExt::oneshot`).
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p spree-storefront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart` - order creation, line items, token recovery
//! - `checkout_flow` - server-confirmed step transitions
//! - `order_ready_poller` - polling cadence and budget
//! - `payment_request` - `PayU` request signing
//! - `routes` - HTTP surface, sessions, order-success redirect

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use httpmock::MockServer;
use secrecy::SecretString;
use serde_json::{Value, json};
use spree_storefront::checkout::{EventBus, OrderService, PollSettings};
use spree_storefront::config::{PayuBizConfig, SpreeConfig, StorefrontConfig};
use spree_storefront::spree::SpreeClient;
use spree_storefront::state::AppState;

/// Storefront configuration pointing at a mock Spree server.
///
/// # Panics
///
/// Panics if the mock server URL is not a valid endpoint.
#[must_use]
pub fn test_config(server: &MockServer) -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        spree: SpreeConfig::new(&server.base_url(), Duration::from_secs(5))
            .expect("mock server URL is a valid endpoint"),
        payubiz: PayuBizConfig {
            key: "gtKFFx".to_string(),
            salt: SecretString::from("eCwWELxi".to_string()),
            app_name: "Pickles".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Polling settings fast enough for tests.
#[must_use]
pub const fn fast_poll(max_attempts: u32) -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(1),
        max_attempts,
    }
}

/// Order service talking to the mock server.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn order_service(server: &MockServer) -> OrderService {
    let config = test_config(server);
    let client = SpreeClient::new(&config.spree).expect("HTTP client builds");
    OrderService::new(client, EventBus::default())
}

/// Application state talking to the mock server.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn app_state(server: &MockServer, poll: PollSettings) -> AppState {
    AppState::with_poll_settings(test_config(server), poll).expect("HTTP client builds")
}

/// Spree line item payload.
#[must_use]
pub fn line_item_json(id: i64, variant_id: i64, quantity: u32) -> Value {
    json!({
        "id": id,
        "variant_id": variant_id,
        "quantity": quantity,
        "price": "10.0",
        "total": format!("{}.0", 10 * quantity),
    })
}

/// Spree order payload.
#[must_use]
pub fn order_json(number: &str, token: &str, state: &str, line_items: &[Value]) -> Value {
    json!({
        "id": 1,
        "number": number,
        "token": token,
        "state": state,
        "total": "25.50",
        "item_count": line_items.len(),
        "line_items": line_items,
        "bill_address": {
            "firstname": "Asha",
            "lastname": "Rao",
            "address1": "12 MG Road",
            "city": "Pune",
            "zipcode": "411001",
            "phone": "9999999999"
        }
    })
}

/// Spree order payload with a shipment state.
#[must_use]
pub fn shipped_order_json(number: &str, shipment_state: &str) -> Value {
    let mut order = order_json(number, "t1", "complete", &[]);
    order["shipment_state"] = json!(shipment_state);
    order
}
