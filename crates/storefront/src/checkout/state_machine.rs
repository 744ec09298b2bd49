//! Checkout step tracking.
//!
//! The step shown to the shopper is derived from the order state Spree
//! returns, never from what the storefront asked for. A failed call leaves
//! the step where it was.

use serde::Serialize;
use spree_storefront_core::{CheckoutState, Money, OrderNumber, PaymentMethodId};

use super::order_service::OrderService;
use super::poller::{OrderReadyPoller, PollOutcome};
use super::token_store::OrderTokenStore;
use super::CheckoutError;
use crate::spree::{CheckoutUpdate, Order};

/// Checkout step presented to the shopper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Cart,
    AddressSelection,
    PaymentSelection,
    PaymentSubmitted,
    Confirmed,
}

impl CheckoutStep {
    /// Step for a Spree checkout state, or `None` for states with no step of
    /// their own (canceled and unknown states).
    #[must_use]
    pub const fn from_checkout_state(state: &CheckoutState) -> Option<Self> {
        match state {
            CheckoutState::Cart => Some(Self::Cart),
            CheckoutState::Address | CheckoutState::Delivery => Some(Self::AddressSelection),
            CheckoutState::Payment => Some(Self::PaymentSelection),
            CheckoutState::Confirm | CheckoutState::Complete => Some(Self::PaymentSubmitted),
            CheckoutState::Canceled | CheckoutState::Other(_) => None,
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// How order-ready polling ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    /// Whether the order's shipments were observed ready.
    pub ready: bool,
    /// Polling attempts made.
    pub attempts: u32,
}

/// Current step plus the order snapshot it was derived from.
#[derive(Debug, Clone, Default)]
pub struct CheckoutMachine {
    step: CheckoutStep,
    order: Option<Order>,
}

impl CheckoutMachine {
    /// Machine at the cart step with no order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Machine positioned at `order`'s step.
    #[must_use]
    pub fn from_order(order: Order) -> Self {
        let mut machine = Self::new();
        machine.observe(order);
        machine
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Apply an order snapshot confirmed by Spree.
    ///
    /// Ignored once confirmed. States without a step of their own keep the
    /// current step but still refresh the snapshot.
    pub fn observe(&mut self, order: Order) -> CheckoutStep {
        if self.step.is_terminal() {
            return self.step;
        }

        if let Some(step) = CheckoutStep::from_checkout_state(&order.state) {
            if step != self.step {
                tracing::debug!(order = %order.number, from = ?self.step, to = ?step, "Checkout step changed");
            }
            self.step = step;
        }
        self.order = Some(order);
        self.step
    }

    /// Enter the terminal step once polling has finished.
    ///
    /// Keeps the previous snapshot when polling never fetched one.
    pub fn confirm(&mut self, outcome: PollOutcome) -> Confirmation {
        let confirmation = Confirmation {
            ready: outcome.is_ready(),
            attempts: outcome.attempts(),
        };
        if let Some(order) = outcome.into_order() {
            self.order = Some(order);
        }
        self.step = CheckoutStep::Confirmed;
        confirmation
    }
}

/// Drives one shopper's checkout through [`OrderService`].
///
/// Every transition waits for Spree's answer before the step changes.
/// The step lives in this value only: once it reaches
/// [`CheckoutStep::Confirmed`] this flow refuses further transitions, but a
/// new flow over the same store starts again from [`CheckoutStep::Cart`].
/// HTTP handlers build one flow per request, so over HTTP Spree's order state
/// is what stops a completed checkout from moving.
pub struct CheckoutFlow<'a, S: OrderTokenStore> {
    service: &'a OrderService,
    store: &'a S,
    machine: CheckoutMachine,
}

impl<'a, S: OrderTokenStore> CheckoutFlow<'a, S> {
    #[must_use]
    pub fn new(service: &'a OrderService, store: &'a S) -> Self {
        Self {
            service,
            store,
            machine: CheckoutMachine::new(),
        }
    }

    #[must_use]
    pub const fn machine(&self) -> &CheckoutMachine {
        &self.machine
    }

    #[must_use]
    pub fn into_machine(self) -> CheckoutMachine {
        self.machine
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.machine.step()
    }

    /// Refuse transitions after this flow has confirmed its order.
    const fn ensure_open(&self) -> Result<(), CheckoutError> {
        if self.machine.step().is_terminal() {
            return Err(CheckoutError::AlreadyConfirmed);
        }
        Ok(())
    }

    /// Load the shopper's current order and position the flow on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the order cannot be loaded.
    pub async fn resume(&mut self) -> Result<CheckoutStep, CheckoutError> {
        if let Some(order) = self.service.fetch_current_order(self.store).await? {
            self.machine.observe(order);
        }
        Ok(self.machine.step())
    }

    /// Ask Spree to move to the next step.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkout is already confirmed or Spree refuses
    /// the transition.
    pub async fn advance(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_open()?;
        let order = self.service.advance_checkout_state(self.store).await?;
        Ok(self.machine.observe(order))
    }

    /// Update checkout fields and follow whatever step Spree reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkout is already confirmed or Spree rejects
    /// the update.
    pub async fn update(&mut self, update: &CheckoutUpdate) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_open()?;
        let order = self.service.update_order(self.store, update).await?;
        Ok(self.machine.observe(order))
    }

    /// Record a payment and advance.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkout is already confirmed or either Spree
    /// call fails.
    pub async fn pay(
        &mut self,
        payment_method_id: PaymentMethodId,
        amount: Money,
    ) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_open()?;
        let order = self
            .service
            .create_payment(self.store, payment_method_id, amount)
            .await?;
        Ok(self.machine.observe(order))
    }

    /// Poll order `number` until ready (or out of attempts) and confirm.
    pub async fn await_confirmation(
        &mut self,
        poller: &OrderReadyPoller,
        number: &OrderNumber,
    ) -> Confirmation {
        let service = self.service;
        let store = self.store;
        let outcome = poller
            .poll(move |_| service.get_order(store, number))
            .await;
        let confirmation = self.machine.confirm(outcome);
        tracing::info!(
            order = %number,
            ready = confirmation.ready,
            attempts = confirmation.attempts,
            "Checkout confirmed"
        );
        confirmation
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::checkout::PollSettings;

    fn order(state: &str) -> Order {
        serde_json::from_value(json!({
            "id": 1,
            "number": "R1",
            "token": "t1",
            "state": state,
        }))
        .unwrap()
    }

    #[test]
    fn test_step_mapping() {
        let cases = [
            ("cart", Some(CheckoutStep::Cart)),
            ("address", Some(CheckoutStep::AddressSelection)),
            ("delivery", Some(CheckoutStep::AddressSelection)),
            ("payment", Some(CheckoutStep::PaymentSelection)),
            ("confirm", Some(CheckoutStep::PaymentSubmitted)),
            ("complete", Some(CheckoutStep::PaymentSubmitted)),
            ("canceled", None),
            ("returned", None),
        ];
        for (state, expected) in cases {
            let state = CheckoutState::from(state.to_string());
            assert_eq!(CheckoutStep::from_checkout_state(&state), expected, "{state}");
        }
    }

    #[test]
    fn test_observe_follows_server_state() {
        let mut machine = CheckoutMachine::new();
        assert_eq!(machine.step(), CheckoutStep::Cart);

        assert_eq!(machine.observe(order("address")), CheckoutStep::AddressSelection);
        assert_eq!(machine.observe(order("payment")), CheckoutStep::PaymentSelection);
        // Spree may send the order back a step
        assert_eq!(machine.observe(order("address")), CheckoutStep::AddressSelection);
    }

    #[test]
    fn test_unknown_state_keeps_step() {
        let mut machine = CheckoutMachine::from_order(order("payment"));
        assert_eq!(machine.observe(order("awaiting_return")), CheckoutStep::PaymentSelection);
        assert_eq!(
            machine.order().unwrap().state,
            CheckoutState::Other("awaiting_return".to_string())
        );
    }

    #[tokio::test]
    async fn test_confirmed_is_terminal() {
        let poller = OrderReadyPoller::new(PollSettings {
            interval: Duration::from_millis(1),
            max_attempts: 1,
        });
        let outcome = poller
            .poll(|_| async { Ok::<_, String>(order("complete")) })
            .await;

        let mut machine = CheckoutMachine::from_order(order("confirm"));
        let confirmation = machine.confirm(outcome);
        assert!(!confirmation.ready);
        assert_eq!(confirmation.attempts, 1);
        assert_eq!(machine.step(), CheckoutStep::Confirmed);
        assert_eq!(machine.observe(order("cart")), CheckoutStep::Confirmed);
        assert!(machine.step().is_terminal());
    }
}
