//! Status enums reported by Spree for an order.
//!
//! Spree is the source of truth for every state here. The storefront only
//! reads them back from API responses, so each enum keeps unknown values in an
//! `Other` variant instead of failing to deserialize when a store adds custom
//! states.

use serde::{Deserialize, Serialize};

/// Checkout step of an order (Spree `order.state`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum CheckoutState {
    #[default]
    Cart,
    Address,
    Delivery,
    Payment,
    Confirm,
    Complete,
    Canceled,
    Other(String),
}

impl CheckoutState {
    /// Returns the Spree wire name of this state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cart => "cart",
            Self::Address => "address",
            Self::Delivery => "delivery",
            Self::Payment => "payment",
            Self::Confirm => "confirm",
            Self::Complete => "complete",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for CheckoutState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "cart" => Self::Cart,
            "address" => Self::Address,
            "delivery" => Self::Delivery,
            "payment" => Self::Payment,
            "confirm" => Self::Confirm,
            "complete" => Self::Complete,
            "canceled" => Self::Canceled,
            _ => Self::Other(s),
        }
    }
}

impl From<CheckoutState> for String {
    fn from(state: CheckoutState) -> Self {
        match state {
            CheckoutState::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fulfillment status of an order's shipments (Spree `order.shipment_state`).
///
/// The storefront polls for [`ShipmentState::Ready`] after the shopper returns
/// from the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum ShipmentState {
    #[default]
    Pending,
    Ready,
    Partial,
    Shipped,
    Backorder,
    Canceled,
    Other(String),
}

impl ShipmentState {
    /// Returns the Spree wire name of this state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Partial => "partial",
            Self::Shipped => "shipped",
            Self::Backorder => "backorder",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }

    /// Whether the shipment is ready to be fulfilled.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl From<String> for ShipmentState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "ready" => Self::Ready,
            "partial" => Self::Partial,
            "shipped" => Self::Shipped,
            "backorder" => Self::Backorder,
            "canceled" => Self::Canceled,
            _ => Self::Other(s),
        }
    }
}

impl From<ShipmentState> for String {
    fn from(state: ShipmentState) -> Self {
        match state {
            ShipmentState::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for ShipmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status of an order (Spree `order.payment_state`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum PaymentState {
    #[default]
    BalanceDue,
    Paid,
    CreditOwed,
    Failed,
    Void,
    Other(String),
}

impl PaymentState {
    /// Returns the Spree wire name of this state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::BalanceDue => "balance_due",
            Self::Paid => "paid",
            Self::CreditOwed => "credit_owed",
            Self::Failed => "failed",
            Self::Void => "void",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for PaymentState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "balance_due" => Self::BalanceDue,
            "paid" => Self::Paid,
            "credit_owed" => Self::CreditOwed,
            "failed" => Self::Failed,
            "void" => Self::Void,
            _ => Self::Other(s),
        }
    }
}

impl From<PaymentState> for String {
    fn from(state: PaymentState) -> Self {
        match state {
            PaymentState::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_state_known_values() {
        let state: CheckoutState = serde_json::from_str("\"delivery\"").unwrap();
        assert_eq!(state, CheckoutState::Delivery);
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"delivery\"");
    }

    #[test]
    fn test_checkout_state_keeps_custom_values() {
        let state: CheckoutState = serde_json::from_str("\"awaiting_return\"").unwrap();
        assert_eq!(state, CheckoutState::Other("awaiting_return".to_string()));
        assert_eq!(state.to_string(), "awaiting_return");
    }

    #[test]
    fn test_shipment_state_ready() {
        let ready: ShipmentState = serde_json::from_str("\"ready\"").unwrap();
        assert!(ready.is_ready());

        let pending: ShipmentState = serde_json::from_str("\"pending\"").unwrap();
        assert!(!pending.is_ready());
    }

    #[test]
    fn test_payment_state_roundtrip() {
        let state: PaymentState = serde_json::from_str("\"balance_due\"").unwrap();
        assert_eq!(state, PaymentState::BalanceDue);
        assert_eq!(String::from(state), "balance_due");
    }
}
