//! Spree REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`, one method per `api/v1` endpoint the checkout uses
//! - Spree is source of truth - NO local sync, direct API calls
//! - Guest order access is authorized with the `order_token` query parameter
//!
//! # Example
//!
//! ```rust,ignore
//! use spree_storefront::spree::{CreateOrderParams, LineItemParams, SpreeClient};
//!
//! let client = SpreeClient::new(&config.spree)?;
//!
//! // Create an order around its first line item
//! let order = client
//!     .create_order(&CreateOrderParams::with_line_item(LineItemParams {
//!         variant_id: VariantId::new(3),
//!         quantity: 1,
//!     }))
//!     .await?;
//!
//! // Move it to the next checkout step
//! let order = client.next_checkout_step(&order.number, &order.token).await?;
//! ```

mod client;
pub mod types;

pub use client::SpreeClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Spree API.
#[derive(Debug, Error)]
pub enum SpreeError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Spree rejected the order token or user credentials.
    #[error("Unauthorized (HTTP {0})")]
    Unauthorized(u16),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Spree returned a non-success status.
    #[error("Spree API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl SpreeError {
    /// Whether the error means the order token is no longer accepted.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spree_error_display() {
        let err = SpreeError::NotFound("api/v1/orders/R1".to_string());
        assert_eq!(err.to_string(), "Not found: api/v1/orders/R1");

        let err = SpreeError::Api {
            status: 422,
            body: "quantity must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Spree API error (HTTP 422): quantity must be positive"
        );
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(SpreeError::Unauthorized(401).is_unauthorized());
        assert!(!SpreeError::NotFound("x".to_string()).is_unauthorized());
    }
}
