//! Newtype IDs for type-safe Spree record references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally passing a line item id where a variant id is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Spree serialises record ids as JSON integers, so the wrapper is a newtype
/// around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>` and `Into<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use spree_storefront_core::define_id;
/// define_id!(ShipmentId);
/// define_id!(StockLocationId);
///
/// let shipment = ShipmentId::new(1);
/// let location = StockLocationId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: ShipmentId = location;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(OrderId);
define_id!(LineItemId);
define_id!(VariantId);
define_id!(PaymentMethodId);
define_id!(PaymentId);
define_id!(AddressId);
define_id!(UserId);
