//! Domain types for the Spree REST API.
//!
//! Response types mirror the JSON that Spree's `api/v1` endpoints return.
//! Request types serialise to the nested shapes Spree expects (`{order: {..}}`,
//! `{line_item: {..}}`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use spree_storefront_core::{
    AddressId, CheckoutState, Email, LineItemId, Money, OrderId, OrderNumber, OrderToken,
    PaymentId, PaymentMethodId, PaymentState, ShipmentState, UserId, VariantId,
};

// =============================================================================
// Order Types
// =============================================================================

/// A shopper's order as returned by Spree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Spree database id.
    pub id: OrderId,
    /// Public order number (e.g. `R123456789`).
    pub number: OrderNumber,
    /// Guest token. Held server-side, never echoed back to the browser.
    #[serde(skip_serializing)]
    pub token: OrderToken,
    /// Checkout step.
    #[serde(default)]
    pub state: CheckoutState,
    /// Shipment fulfillment state (absent until checkout completes).
    #[serde(default)]
    pub shipment_state: Option<ShipmentState>,
    /// Payment state (absent until a payment exists).
    #[serde(default)]
    pub payment_state: Option<PaymentState>,
    /// Email attached to the order.
    #[serde(default)]
    pub email: Option<String>,
    /// Sum of line item totals.
    #[serde(default)]
    pub item_total: Money,
    /// Shipping total.
    #[serde(default)]
    pub ship_total: Money,
    /// Tax total.
    #[serde(default)]
    pub tax_total: Money,
    /// Promotion and other adjustments.
    #[serde(default)]
    pub adjustment_total: Money,
    /// Grand total.
    #[serde(default)]
    pub total: Money,
    /// Number of items across all line items.
    #[serde(default)]
    pub item_count: i64,
    /// Line items in display order.
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Billing address.
    #[serde(default)]
    pub bill_address: Option<Address>,
    /// Shipping address.
    #[serde(default)]
    pub ship_address: Option<Address>,
}

impl Order {
    /// Whether Spree reports the order's shipments as ready.
    #[must_use]
    pub fn is_shipment_ready(&self) -> bool {
        self.shipment_state
            .as_ref()
            .is_some_and(ShipmentState::is_ready)
    }
}

/// One variant-and-quantity entry of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Line item id.
    pub id: LineItemId,
    /// Variant being purchased.
    pub variant_id: VariantId,
    /// Quantity ordered.
    pub quantity: u32,
    /// Unit price at the time the item was added.
    #[serde(default)]
    pub price: Money,
    /// `price * quantity` after adjustments.
    #[serde(default)]
    pub total: Money,
    /// Denormalised variant display data.
    #[serde(default)]
    pub variant: Option<Variant>,
}

impl LineItem {
    /// URL of the first small variant image, if any.
    #[must_use]
    pub fn small_image_url(&self) -> Option<&str> {
        self.variant
            .as_ref()
            .and_then(|v| v.images.first())
            .and_then(|img| img.small_url.as_deref())
    }
}

/// Variant display data embedded in a line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    /// Variant id.
    pub id: VariantId,
    /// Product name.
    #[serde(default)]
    pub name: String,
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: String,
    /// Current variant price.
    #[serde(default)]
    pub price: Money,
    /// Variant images.
    #[serde(default)]
    pub images: Vec<VariantImage>,
}

/// Image URLs at the sizes Spree generates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantImage {
    #[serde(default)]
    pub small_url: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub large_url: Option<String>,
}

/// Billing or shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AddressId>,
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_id: Option<i64>,
}

// =============================================================================
// Payment Types
// =============================================================================

/// A payment method offered for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
    #[serde(default)]
    pub method_type: Option<String>,
}

/// Response of `GET /api/v1/orders/{number}/payments/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodsResponse {
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethod>,
}

/// A payment recorded against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    #[serde(default)]
    pub amount: Money,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<PaymentMethodId>,
}

/// Whether the store ships to a postal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentAvailability {
    pub available: bool,
}

// =============================================================================
// Auth Types
// =============================================================================

/// A signed-in Spree user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
}

/// Result of asking Spree whether the current shopper is signed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Authorization {
    Authorized { user: User },
    Unauthorized,
}

/// Result of a social (OAuth) login attempt.
///
/// Spree either signs the shopper in immediately or defers (for example while
/// the provider still needs confirmation). The explicit `status` tag decides
/// which, never the shape of the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginOutcome {
    LoggedIn {
        user: User,
    },
    Deferred {
        #[serde(default)]
        message: Option<String>,
    },
}

/// Social login request forwarded to Spree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialLogin {
    /// OAuth provider name (e.g. `google`, `facebook`).
    pub provider: String,
    /// Authorization code returned by the provider.
    pub authorization_code: String,
}

// =============================================================================
// Request Types
// =============================================================================

/// Variant and quantity of a line item to add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemParams {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Body of `POST /api/v1/orders/{number}/line_items`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AddLineItemBody {
    pub line_item: LineItemParams,
}

/// Body of `POST /api/v1/orders`.
///
/// Spree expects embedded line items as an index-keyed object
/// (`{"0": {..}, "1": {..}}`), not an array.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateOrderParams {
    pub order: NewOrder,
}

/// Inner `order` object of [`CreateOrderParams`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewOrder {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub line_items: BTreeMap<usize, LineItemParams>,
}

impl CreateOrderParams {
    /// An order with no line items (`{"order": {}}`).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// An order created around its first line item.
    #[must_use]
    pub fn with_line_item(line_item: LineItemParams) -> Self {
        let mut params = Self::default();
        params.order.line_items.insert(0, line_item);
        params
    }
}

/// Body of `PUT /api/v1/checkouts/{number}.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutUpdate {
    pub order: CheckoutFields,
}

/// Checkout fields that may be updated. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_address_attributes: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_address_attributes: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_billing: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shipments_attributes: BTreeMap<usize, ShippingRateSelection>,
}

/// Chosen shipping rate for one shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRateSelection {
    pub id: i64,
    pub selected_shipping_rate_id: i64,
}

/// Body of `POST /api/v1/orders/{number}/payments`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PaymentParams {
    pub payment: NewPayment,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewPayment {
    pub payment_method_id: PaymentMethodId,
    pub amount: Money,
}

/// Body of `POST address/shipment_availability`.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct ShipmentAvailabilityParams {
    pub pincode: u32,
}
