//! Core types for the Spree storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod order_ref;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use order_ref::{OrderNumber, OrderToken};
pub use status::*;
