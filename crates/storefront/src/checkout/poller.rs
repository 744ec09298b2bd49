//! Order-ready polling.
//!
//! After the payment gateway redirects back, the order's shipments take a
//! moment to become ready. The poller re-fetches the order on a fixed
//! interval and stops at the first ready snapshot or once the attempt budget
//! is spent, whichever comes first. Dropping the future cancels polling.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::spree::Order;

/// Delay between polling attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Attempt budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Shortest interval the poller will tick at.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Polling cadence and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Result of a polling run.
///
/// Only produced by [`OrderReadyPoller::poll`].
#[derive(Debug, Clone)]
pub struct PollOutcome {
    order: Option<Order>,
    attempts: u32,
    ready: bool,
}

impl PollOutcome {
    /// Whether a ready order was observed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Attempts made, including the one that observed readiness.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The ready order, or the last snapshot fetched if the budget ran out.
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Take the order out of the outcome.
    #[must_use]
    pub fn into_order(self) -> Option<Order> {
        self.order
    }
}

/// Polls an order until its shipments are ready.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderReadyPoller {
    settings: PollSettings,
}

impl OrderReadyPoller {
    #[must_use]
    pub const fn new(settings: PollSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub const fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Poll with `fetch` until the order is ready or the budget is spent.
    ///
    /// Each attempt waits one interval, then calls `fetch` with the 1-based
    /// attempt number. A failed fetch is logged and counts as an attempt.
    pub async fn poll<F, Fut, E>(&self, mut fetch: F) -> PollOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Order, E>>,
        E: Display,
    {
        let period = self.settings.interval.max(MIN_POLL_INTERVAL);
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last = None;
        for attempt in 1..=self.settings.max_attempts {
            ticker.tick().await;

            match fetch(attempt).await {
                Ok(order) if order.is_shipment_ready() => {
                    tracing::info!(order = %order.number, attempt, "Order is ready");
                    return PollOutcome {
                        order: Some(order),
                        attempts: attempt,
                        ready: true,
                    };
                }
                Ok(order) => last = Some(order),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Order status fetch failed");
                }
            }
        }

        tracing::warn!(
            attempts = self.settings.max_attempts,
            "Order not ready before polling budget ran out"
        );
        PollOutcome {
            order: last,
            attempts: self.settings.max_attempts,
            ready: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::json;

    use super::*;

    fn order(shipment_state: Option<&str>) -> Order {
        serde_json::from_value(json!({
            "id": 1,
            "number": "R1",
            "token": "t1",
            "state": "complete",
            "shipment_state": shipment_state,
        }))
        .unwrap()
    }

    fn fast(max_attempts: u32) -> OrderReadyPoller {
        OrderReadyPoller::new(PollSettings {
            interval: Duration::from_millis(1),
            max_attempts,
        })
    }

    #[test]
    fn test_default_settings() {
        let settings = PollSettings::default();
        assert_eq!(settings.interval, Duration::from_millis(200));
        assert_eq!(settings.max_attempts, 30);
    }

    #[tokio::test]
    async fn test_stops_at_first_ready_snapshot() {
        let calls = AtomicU32::new(0);
        let outcome = fast(30)
            .poll(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let state = if attempt >= 4 { "ready" } else { "pending" };
                    Ok::<_, String>(order(Some(state)))
                }
            })
            .await;

        assert!(outcome.is_ready());
        assert_eq!(outcome.attempts(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failed_fetches_count_as_attempts() {
        let outcome = fast(5)
            .poll(|attempt| async move {
                if attempt < 3 {
                    Err("backend down")
                } else {
                    Ok(order(Some("ready")))
                }
            })
            .await;

        assert!(outcome.is_ready());
        assert_eq!(outcome.attempts(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_keeps_last_snapshot() {
        let outcome = fast(3)
            .poll(|_| async { Ok::<_, String>(order(None)) })
            .await;

        assert!(!outcome.is_ready());
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(outcome.order().unwrap().number.as_str(), "R1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_one_interval_before_each_attempt() {
        let poller = OrderReadyPoller::new(PollSettings::default());
        let start = Instant::now();

        let outcome = poller
            .poll(|attempt| async move {
                let state = if attempt == 2 { "ready" } else { "pending" };
                Ok::<_, String>(order(Some(state)))
            })
            .await;

        assert_eq!(outcome.attempts(), 2);
        assert_eq!(start.elapsed(), Duration::from_millis(400));
    }
}
