//! Order number and order token.
//!
//! Spree identifies an order publicly by its number (e.g. `R123456789`) and
//! authorizes guest access to it with an opaque per-order token. The pair is
//! the only credential a shopper holds for an in-progress order.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Public order number assigned by Spree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Create an order number from any string-like value.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderNumber {
    fn from(number: &str) -> Self {
        Self::new(number)
    }
}

/// Opaque guest token authorizing mutations of a single order.
///
/// `Debug` is redacted so tokens never end up in logs. Use
/// [`OrderToken::expose`] when the value has to go on the wire.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderToken(String);

impl OrderToken {
    /// Wrap a raw token value.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for use in a request.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OrderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OrderToken([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_token_debug_is_redacted() {
        let token = OrderToken::new("s3cr3t-guest-token");
        let debug = format!("{token:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("s3cr3t"));
        assert_eq!(token.expose(), "s3cr3t-guest-token");
    }

    #[test]
    fn test_order_number_is_transparent_json() {
        let number: OrderNumber = serde_json::from_str("\"R123456789\"").unwrap();
        assert_eq!(number.as_str(), "R123456789");
        assert_eq!(number.to_string(), "R123456789");
    }
}
