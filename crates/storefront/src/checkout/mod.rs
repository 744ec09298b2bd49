//! Cart and checkout orchestration.
//!
//! # Architecture
//!
//! - [`OrderService`] wraps the Spree client with session-scoped order token
//!   handling, notices and event publication
//! - [`CheckoutFlow`] drives an order through the checkout steps and only
//!   moves forward on server-confirmed state
//! - [`OrderReadyPoller`] waits for a paid order's shipments to become ready
//! - [`PaymentRequestBuilder`] signs the `PayU` payment request
//!
//! All session state goes through an [`OrderTokenStore`], so the same service
//! serves shoppers (session store), tests (memory store) and background work
//! (detached store).

pub mod events;
pub mod order_service;
pub mod payment;
pub mod poller;
pub mod state_machine;
pub mod token_store;

pub use events::{CheckoutEvent, EventBus, Notice, NoticeLevel};
pub use order_service::OrderService;
pub use payment::{PaymentInput, PaymentRequest, PaymentRequestBuilder};
pub use poller::{OrderReadyPoller, PollOutcome, PollSettings};
pub use state_machine::{CheckoutFlow, CheckoutMachine, CheckoutStep, Confirmation};
pub use token_store::{
    DetachedTokenStore, MemoryTokenStore, OrderTokenRecord, OrderTokenStore, SessionTokenStore,
    TokenStoreError,
};

use spree_storefront_core::OrderNumber;
use thiserror::Error;

use crate::spree::SpreeError;

/// Errors from cart and checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The Spree call failed.
    #[error(transparent)]
    Spree(#[from] SpreeError),

    /// The operation needs a current order but the session has none.
    #[error("no current order for this session")]
    NoCurrentOrder,

    /// Spree created the order but returned it without the requested line item.
    #[error("order {0} was created without line items")]
    EmptyOrder(OrderNumber),

    /// Order token storage failed.
    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),

    /// Payment needs a signed-in shopper's email.
    #[error("a signed-in shopper is required to pay")]
    MissingCustomerEmail,

    /// Payment needs a billing address on the order.
    #[error("order {0} has no billing address")]
    MissingBillingAddress(OrderNumber),

    /// A shopper-supplied payment field would corrupt the signed sequence.
    #[error("payment field {0} must not contain '|'")]
    InvalidPaymentField(&'static str),

    /// This flow already reached its terminal step.
    #[error("checkout is already confirmed")]
    AlreadyConfirmed,
}
