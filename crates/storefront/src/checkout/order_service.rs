//! Session-scoped order operations.
//!
//! Every mutating call surfaces its outcome as a [`Notice`] on the
//! [`EventBus`]. Calls that need the current order read the token from the
//! given [`OrderTokenStore`] and fail with [`CheckoutError::NoCurrentOrder`]
//! when there is none.

use spree_storefront_core::{Money, OrderNumber, PaymentMethodId, VariantId};
use tracing::instrument;

use super::events::{EventBus, Notice};
use super::payment::PaymentRequest;
use super::token_store::{OrderTokenRecord, OrderTokenStore};
use super::CheckoutError;
use crate::spree::{
    CheckoutUpdate, CreateOrderParams, LineItem, LineItemParams, Order, PaymentMethod,
    ShipmentAvailability, SpreeClient, SpreeError,
};

/// How many times an add is retried after Spree rejects a stored token.
const MAX_TOKEN_RETRIES: u32 = 1;

/// Cart and checkout operations against Spree.
///
/// Cheap to clone; clones share the client and the event bus.
#[derive(Clone)]
pub struct OrderService {
    client: SpreeClient,
    events: EventBus,
}

impl OrderService {
    /// Create a service publishing to `events`.
    #[must_use]
    pub const fn new(client: SpreeClient, events: EventBus) -> Self {
        Self { client, events }
    }

    /// Event bus this service publishes to.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Underlying Spree client.
    #[must_use]
    pub const fn client(&self) -> &SpreeClient {
        &self.client
    }

    async fn current_record<S: OrderTokenStore>(
        &self,
        store: &S,
    ) -> Result<OrderTokenRecord, CheckoutError> {
        store.get().await.ok_or(CheckoutError::NoCurrentOrder)
    }

    /// Publish a notice for the outcome of a mutating call.
    fn report<T>(
        &self,
        result: Result<T, SpreeError>,
        success: Option<Notice>,
    ) -> Result<T, CheckoutError> {
        match result {
            Ok(value) => {
                if let Some(notice) = success {
                    self.events.notice(notice);
                }
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order operation failed");
                self.events.notice(Notice::failed());
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Create an order and make it the session's current order.
    ///
    /// # Errors
    ///
    /// Returns an error if Spree rejects the order or the token cannot be
    /// stored.
    #[instrument(skip(self, store, params))]
    pub async fn create_order<S: OrderTokenStore>(
        &self,
        store: &S,
        params: &CreateOrderParams,
    ) -> Result<Order, CheckoutError> {
        let order = self.report(
            self.client.create_order(params).await,
            Some(Notice::cart_updated()),
        )?;

        store.set(OrderTokenRecord::from(&order)).await?;
        self.events.order_updated(&order);
        tracing::info!(order = %order.number, "Order created");

        Ok(order)
    }

    /// Create an order with no line items.
    ///
    /// The order is returned as-is and does not replace the session's current
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if Spree rejects the order.
    #[instrument(skip(self))]
    pub async fn create_empty_order(&self) -> Result<Order, CheckoutError> {
        Ok(self
            .client
            .create_order(&CreateOrderParams::empty())
            .await?)
    }

    /// Add a variant to the current order, creating the order if needed.
    ///
    /// When Spree rejects the stored token, the token is cleared and the add
    /// is retried once, which creates a fresh order around the item.
    ///
    /// # Errors
    ///
    /// Returns an error if Spree rejects the item, rejects a freshly created
    /// order's token, or the token store fails.
    #[instrument(skip(self, store))]
    pub async fn add_line_item<S: OrderTokenStore>(
        &self,
        store: &S,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<LineItem, CheckoutError> {
        let line_item = LineItemParams {
            variant_id,
            quantity,
        };
        let mut retries = 0;

        loop {
            let Some(record) = store.get().await else {
                let order = self
                    .create_order(store, &CreateOrderParams::with_line_item(line_item))
                    .await?;
                let number = order.number.clone();
                return order
                    .line_items
                    .into_iter()
                    .next()
                    .ok_or(CheckoutError::EmptyOrder(number));
            };

            match self
                .client
                .add_line_item(&record.order_number, &record.order_token, line_item)
                .await
            {
                Ok(item) => {
                    self.events.notice(Notice::cart_updated());
                    return Ok(item);
                }
                Err(e) if e.is_unauthorized() && retries < MAX_TOKEN_RETRIES => {
                    tracing::warn!(
                        order = %record.order_number,
                        "Order token rejected, starting a new order"
                    );
                    store.clear().await?;
                    retries += 1;
                }
                Err(e) => return self.report(Err(e), None),
            }
        }
    }

    /// Remove a line item from the current order.
    ///
    /// Returns the removed item unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoCurrentOrder` without a current order, or an
    /// error if Spree rejects the removal.
    #[instrument(skip(self, store, line_item), fields(line_item = %line_item.id))]
    pub async fn remove_line_item<S: OrderTokenStore>(
        &self,
        store: &S,
        line_item: LineItem,
    ) -> Result<LineItem, CheckoutError> {
        let record = self.current_record(store).await?;
        self.report(
            self.client
                .remove_line_item(&record.order_number, &record.order_token, line_item.id)
                .await,
            Some(Notice::cart_updated()),
        )?;
        Ok(line_item)
    }

    /// Load the shopper's current order.
    ///
    /// Spree's own notion of the current order wins; otherwise the stored token
    /// is used. Spree refusing `/orders/current` to an anonymous shopper counts
    /// as having no current order there. A stored token Spree no longer accepts is cleared. Storage is
    /// only written when an order is found.
    ///
    /// # Errors
    ///
    /// Returns an error if a Spree call fails for a reason other than a stale
    /// token, or the token store fails.
    #[instrument(skip(self, store))]
    pub async fn fetch_current_order<S: OrderTokenStore>(
        &self,
        store: &S,
    ) -> Result<Option<Order>, CheckoutError> {
        let remote = match self.client.current_order().await {
            Ok(order) => order,
            Err(SpreeError::Unauthorized(status)) => {
                tracing::debug!(status, "No remote current order for an anonymous shopper");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let order = match remote {
            Some(order) => Some(order),
            None => match store.get().await {
                Some(record) => {
                    match self
                        .client
                        .get_order(&record.order_number, Some(&record.order_token))
                        .await
                    {
                        Ok(order) => Some(order),
                        Err(SpreeError::Unauthorized(_) | SpreeError::NotFound(_)) => {
                            tracing::info!(
                                order = %record.order_number,
                                "Stored order is no longer available"
                            );
                            store.clear().await?;
                            None
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                None => None,
            },
        };

        if let Some(order) = &order {
            store.set(OrderTokenRecord::from(order)).await?;
            self.events.order_updated(order);
        }

        Ok(order)
    }

    /// Get an order by number, authorized with the session's token if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the request fails.
    #[instrument(skip(self, store))]
    pub async fn get_order<S: OrderTokenStore>(
        &self,
        store: &S,
        number: &OrderNumber,
    ) -> Result<Order, CheckoutError> {
        let token = store
            .get()
            .await
            .filter(|record| record.order_number == *number)
            .map(|record| record.order_token);
        Ok(self.client.get_order(number, token.as_ref()).await?)
    }

    /// Forget the session's current order without touching Spree.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store fails.
    pub async fn remove_local_order<S: OrderTokenStore>(
        &self,
        store: &S,
    ) -> Result<(), CheckoutError> {
        store.clear().await?;
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Move the current order to its next checkout step.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoCurrentOrder` without a current order, or an
    /// error if Spree refuses the transition.
    #[instrument(skip(self, store))]
    pub async fn advance_checkout_state<S: OrderTokenStore>(
        &self,
        store: &S,
    ) -> Result<Order, CheckoutError> {
        let record = self.current_record(store).await?;
        let order = self.report(
            self.client
                .next_checkout_step(&record.order_number, &record.order_token)
                .await,
            None,
        )?;
        self.events.state_changed(&order);
        Ok(order)
    }

    /// Apply checkout field updates to the current order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoCurrentOrder` without a current order, or an
    /// error if Spree rejects the update.
    #[instrument(skip(self, store, update))]
    pub async fn update_order<S: OrderTokenStore>(
        &self,
        store: &S,
        update: &CheckoutUpdate,
    ) -> Result<Order, CheckoutError> {
        let record = self.current_record(store).await?;
        let order = self.report(
            self.client
                .update_checkout(&record.order_number, &record.order_token, update)
                .await,
            None,
        )?;
        self.events.state_changed(&order);
        Ok(order)
    }

    /// Payment methods Spree offers for the current order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoCurrentOrder` without a current order, or an
    /// error if the request fails.
    #[instrument(skip(self, store))]
    pub async fn available_payment_methods<S: OrderTokenStore>(
        &self,
        store: &S,
    ) -> Result<Vec<PaymentMethod>, CheckoutError> {
        let record = self.current_record(store).await?;
        Ok(self
            .client
            .payment_methods(&record.order_number, &record.order_token)
            .await?)
    }

    /// Record a payment on the current order, then advance its checkout.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoCurrentOrder` without a current order, or an
    /// error if either Spree call fails.
    #[instrument(skip(self, store))]
    pub async fn create_payment<S: OrderTokenStore>(
        &self,
        store: &S,
        payment_method_id: PaymentMethodId,
        amount: Money,
    ) -> Result<Order, CheckoutError> {
        let record = self.current_record(store).await?;
        self.report(
            self.client
                .create_payment(
                    &record.order_number,
                    &record.order_token,
                    payment_method_id,
                    amount,
                )
                .await,
            None,
        )?;
        self.advance_checkout_state(store).await
    }

    /// Whether the store delivers to `pincode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn shipment_availability(
        &self,
        pincode: u32,
    ) -> Result<ShipmentAvailability, CheckoutError> {
        Ok(self.client.shipment_availability(pincode).await?)
    }

    /// Forward a signed payment request to the gateway bridge.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, request), fields(txnid = %request.txnid))]
    pub async fn submit_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<serde_json::Value, CheckoutError> {
        self.report(self.client.post_payubiz_request(request).await, None)
    }
}
