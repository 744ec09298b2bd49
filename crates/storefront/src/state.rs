//! Application state shared across handlers.

use std::sync::Arc;

use crate::checkout::{
    EventBus, OrderReadyPoller, OrderService, PaymentRequestBuilder, PollSettings,
};
use crate::config::StorefrontConfig;
use crate::spree::{SpreeClient, SpreeError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds no per-shopper data; order tokens live
/// in each shopper's session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    orders: OrderService,
    payments: PaymentRequestBuilder,
    poller: OrderReadyPoller,
}

impl AppState {
    /// Create application state with the default polling cadence.
    ///
    /// # Errors
    ///
    /// Returns an error if the Spree HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, SpreeError> {
        Self::with_poll_settings(config, PollSettings::default())
    }

    /// Create application state with a custom polling cadence.
    ///
    /// # Errors
    ///
    /// Returns an error if the Spree HTTP client cannot be built.
    pub fn with_poll_settings(
        config: StorefrontConfig,
        poll: PollSettings,
    ) -> Result<Self, SpreeError> {
        let client = SpreeClient::new(&config.spree)?;
        let orders = OrderService::new(client, EventBus::default());
        let payments = PaymentRequestBuilder::new(&config.payubiz, &config.spree.api_endpoint);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                orders,
                payments,
                poller: OrderReadyPoller::new(poll),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the order service.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Get a reference to the Spree API client.
    #[must_use]
    pub fn spree(&self) -> &SpreeClient {
        self.inner.orders.client()
    }

    /// Get a reference to the checkout event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        self.inner.orders.events()
    }

    /// Get a reference to the payment request builder.
    #[must_use]
    pub fn payments(&self) -> &PaymentRequestBuilder {
        &self.inner.payments
    }

    /// Get a reference to the order-ready poller.
    #[must_use]
    pub fn poller(&self) -> &OrderReadyPoller {
        &self.inner.poller
    }
}
