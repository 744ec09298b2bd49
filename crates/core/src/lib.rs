//! Spree Storefront Core - Shared types library.
//!
//! This crate provides the types shared between the storefront server and
//! its integration tests:
//! - typed ids for Spree records (variants, line items, payment methods)
//! - the order number and order token pair that proves order ownership
//! - checkout, shipment and payment states as reported by Spree
//! - decimal money amounts
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! storage. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, tokens, emails, money and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
