//! Checkout event fan-out.
//!
//! Order updates, checkout state changes and user-facing notices are published
//! on a `tokio::sync::broadcast` channel. Any number of observers may subscribe;
//! publishing never blocks and never fails when nobody listens.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::spree::Order;

/// Default channel capacity. Slow subscribers skip events beyond this.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message shown to the shopper (toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    /// Success notice.
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Error notice.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Shown after any successful cart mutation.
    #[must_use]
    pub fn cart_updated() -> Self {
        Self::success("Success!", "Cart updated!")
    }

    /// Shown after a failed cart or checkout call.
    #[must_use]
    pub fn failed() -> Self {
        Self::error("Something went wrong!", "Failed")
    }
}

/// Something observers of the checkout may care about.
#[derive(Debug, Clone)]
pub enum CheckoutEvent {
    /// Fresh order snapshot from Spree.
    OrderUpdated(Box<Order>),
    /// Order after a checkout transition or update.
    StateChanged(Box<Order>),
    /// Notice for the shopper.
    Notice(Notice),
}

/// Multi-subscriber event channel for checkout events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CheckoutEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    /// Create a bus that buffers up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CheckoutEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: CheckoutEvent) {
        // Err only means there are no subscribers right now
        let _ = self.sender.send(event);
    }

    /// Publish a fresh order snapshot.
    pub fn order_updated(&self, order: &Order) {
        self.publish(CheckoutEvent::OrderUpdated(Box::new(order.clone())));
    }

    /// Publish an order after a checkout transition.
    pub fn state_changed(&self, order: &Order) {
        self.publish(CheckoutEvent::StateChanged(Box::new(order.clone())));
    }

    /// Publish a shopper notice.
    pub fn notice(&self, notice: Notice) {
        self.publish(CheckoutEvent::Notice(notice));
    }
}

/// Log every checkout event until the bus is dropped.
///
/// Spawned once at startup so notices and transitions show up in traces even
/// when no UI is subscribed.
pub fn spawn_event_logger(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut receiver = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(CheckoutEvent::OrderUpdated(order)) => {
                    tracing::debug!(order = %order.number, item_count = order.item_count, "Order updated");
                }
                Ok(CheckoutEvent::StateChanged(order)) => {
                    tracing::info!(order = %order.number, state = %order.state, "Checkout state changed");
                }
                Ok(CheckoutEvent::Notice(notice)) => match notice.level {
                    NoticeLevel::Success => {
                        tracing::debug!(title = %notice.title, message = %notice.message, "Notice");
                    }
                    NoticeLevel::Error => {
                        tracing::warn!(title = %notice.title, message = %notice.message, "Notice");
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Checkout event logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
