//! Spree API client implementation.
//!
//! Every request goes through [`SpreeClient::execute`], which maps HTTP
//! statuses onto [`SpreeError`] and logs unparseable bodies. Order endpoints
//! take the guest token explicitly; the client never stores one.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use spree_storefront_core::{LineItemId, OrderNumber, OrderToken, PaymentMethodId};
use tracing::{debug, instrument};
use url::Url;

use crate::config::SpreeConfig;
use crate::spree::SpreeError;
use crate::spree::types::{
    AddLineItemBody, Authorization, CheckoutUpdate, CreateOrderParams, LineItem, LineItemParams,
    LoginOutcome, NewPayment, Order, Payment, PaymentMethod, PaymentMethodsResponse,
    PaymentParams, ShipmentAvailability, ShipmentAvailabilityParams, SocialLogin,
};

/// Maximum number of body characters kept in errors and logs.
const BODY_EXCERPT_CHARS: usize = 500;

/// Client for the Spree REST API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct SpreeClient {
    inner: Arc<SpreeClientInner>,
}

struct SpreeClientInner {
    client: reqwest::Client,
    base: Url,
}

impl SpreeClient {
    /// Create a new Spree API client.
    ///
    /// # Errors
    ///
    /// Returns `SpreeError::Http` if the HTTP client cannot be built.
    pub fn new(config: &SpreeConfig) -> Result<Self, SpreeError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(SpreeClientInner {
                client,
                base: config.api_endpoint.clone(),
            }),
        })
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SpreeError> {
        let mut url = self.inner.base.clone();
        url.path_segments_mut()
            .map_err(|()| SpreeError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build an order endpoint URL carrying the guest token.
    fn order_endpoint(&self, segments: &[&str], token: &OrderToken) -> Result<Url, SpreeError> {
        let mut url = self.endpoint(segments)?;
        url.query_pairs_mut()
            .append_pair("order_token", token.expose());
        Ok(url)
    }

    /// Send a request and return the status and raw body.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(StatusCode, String), SpreeError> {
        let response = request.header("Accept", "application/json").send().await?;

        let status = response.status();
        let path = response.url().path().to_string();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!(status = %status, path = %path, "Spree rejected credentials");
            return Err(SpreeError::Unauthorized(status.as_u16()));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(SpreeError::NotFound(path));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %excerpt(&body),
                "Spree API returned non-success status"
            );
            return Err(SpreeError::Api {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        Ok((status, body))
    }

    /// Send a request and parse the JSON response.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SpreeError> {
        let (_, body) = self.execute(request).await?;
        parse_body(&body)
    }

    fn post<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> reqwest::RequestBuilder {
        self.inner.client.post(url).json(body)
    }

    fn put<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> reqwest::RequestBuilder {
        self.inner.client.put(url).json(body)
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Create a new order, optionally with embedded line items.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, params))]
    pub async fn create_order(&self, params: &CreateOrderParams) -> Result<Order, SpreeError> {
        let url = self.endpoint(&["api", "v1", "orders"])?;
        self.execute_json(self.post(url, params)).await
    }

    /// Get the current order for the session, if Spree knows one.
    ///
    /// Spree answers with `null` (or an empty body) when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn current_order(&self) -> Result<Option<Order>, SpreeError> {
        let url = self.endpoint(&["api", "v1", "orders", "current"])?;
        let (status, body) = self.execute(self.inner.client.get(url)).await?;

        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(None);
        }
        parse_body(&body)
    }

    /// Get an order by number.
    ///
    /// Without a token Spree only answers for orders owned by the signed-in
    /// user.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found, the token is rejected, or
    /// the API request fails.
    #[instrument(skip(self, token), fields(order = %number))]
    pub async fn get_order(
        &self,
        number: &OrderNumber,
        token: Option<&OrderToken>,
    ) -> Result<Order, SpreeError> {
        let segments = ["api", "v1", "orders", number.as_str()];
        let url = match token {
            Some(token) => self.order_endpoint(&segments, token)?,
            None => self.endpoint(&segments)?,
        };
        self.execute_json(self.inner.client.get(url)).await
    }

    /// Add a line item to an existing order.
    ///
    /// # Errors
    ///
    /// Returns `SpreeError::Unauthorized` if the token is rejected, or another
    /// error if the API request fails.
    #[instrument(skip(self, token), fields(order = %number))]
    pub async fn add_line_item(
        &self,
        number: &OrderNumber,
        token: &OrderToken,
        line_item: LineItemParams,
    ) -> Result<LineItem, SpreeError> {
        let url = self.order_endpoint(
            &["api", "v1", "orders", number.as_str(), "line_items"],
            token,
        )?;
        self.execute_json(self.post(url, &AddLineItemBody { line_item }))
            .await
    }

    /// Delete a line item from an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the API request fails.
    #[instrument(skip(self, token), fields(order = %number))]
    pub async fn remove_line_item(
        &self,
        number: &OrderNumber,
        token: &OrderToken,
        line_item_id: LineItemId,
    ) -> Result<(), SpreeError> {
        let id = line_item_id.to_string();
        let url = self.order_endpoint(
            &["api", "v1", "orders", number.as_str(), "line_items", &id],
            token,
        )?;
        self.execute(self.inner.client.delete(url)).await?;
        Ok(())
    }

    // =========================================================================
    // Checkout Methods
    // =========================================================================

    /// Advance the order to its next checkout step.
    ///
    /// # Errors
    ///
    /// Returns an error if Spree refuses the transition or the request fails.
    #[instrument(skip(self, token), fields(order = %number))]
    pub async fn next_checkout_step(
        &self,
        number: &OrderNumber,
        token: &OrderToken,
    ) -> Result<Order, SpreeError> {
        let url = self.order_endpoint(
            &["api", "v1", "checkouts", number.as_str(), "next.json"],
            token,
        )?;
        self.execute_json(self.put(url, &serde_json::json!({})))
            .await
    }

    /// Update checkout fields (addresses, email, shipping rate).
    ///
    /// # Errors
    ///
    /// Returns an error if Spree rejects the update or the request fails.
    #[instrument(skip(self, token, update), fields(order = %number))]
    pub async fn update_checkout(
        &self,
        number: &OrderNumber,
        token: &OrderToken,
        update: &CheckoutUpdate,
    ) -> Result<Order, SpreeError> {
        let segment = format!("{number}.json");
        let url = self.order_endpoint(&["api", "v1", "checkouts", &segment], token)?;
        self.execute_json(self.put(url, update)).await
    }

    /// List payment methods available for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(order = %number))]
    pub async fn payment_methods(
        &self,
        number: &OrderNumber,
        token: &OrderToken,
    ) -> Result<Vec<PaymentMethod>, SpreeError> {
        let url = self.order_endpoint(
            &["api", "v1", "orders", number.as_str(), "payments", "new"],
            token,
        )?;
        let response: PaymentMethodsResponse =
            self.execute_json(self.inner.client.get(url)).await?;
        Ok(response.payment_methods)
    }

    /// Record a payment against an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(order = %number))]
    pub async fn create_payment(
        &self,
        number: &OrderNumber,
        token: &OrderToken,
        payment_method_id: PaymentMethodId,
        amount: spree_storefront_core::Money,
    ) -> Result<Payment, SpreeError> {
        let url = self.order_endpoint(
            &["api", "v1", "orders", number.as_str(), "payments"],
            token,
        )?;
        let body = PaymentParams {
            payment: NewPayment {
                payment_method_id,
                amount,
            },
        };
        self.execute_json(self.post(url, &body)).await
    }

    /// Check whether the store delivers to a postal code.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn shipment_availability(
        &self,
        pincode: u32,
    ) -> Result<ShipmentAvailability, SpreeError> {
        let url = self.endpoint(&["address", "shipment_availability"])?;
        self.execute_json(self.post(url, &ShipmentAvailabilityParams { pincode }))
            .await
    }

    /// Forward a signed payment request to the backend's `PayU` bridge.
    ///
    /// The response is passed through untouched; it carries whatever the
    /// gateway needs for the redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, params))]
    pub async fn post_payubiz_request<P: Serialize + Sync + ?Sized>(
        &self,
        params: &P,
    ) -> Result<serde_json::Value, SpreeError> {
        let url = self.endpoint(&["payubiz", "post_request_payubiz"])?;
        self.execute_json(self.post(url, &PayuBizEnvelope { params }))
            .await
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Ask Spree whether the shopper holding `bearer` is signed in.
    ///
    /// Without credentials Spree answers unauthorized.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, bearer))]
    pub async fn authorization(&self, bearer: Option<&str>) -> Result<Authorization, SpreeError> {
        let url = self.endpoint(&["auth", "authenticated"])?;
        let mut request = self.inner.client.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        match self.execute_json(request).await {
            Err(SpreeError::Unauthorized(_)) => Ok(Authorization::Unauthorized),
            other => other,
        }
    }

    /// Exchange a social provider authorization code for a Spree session.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, login), fields(provider = %login.provider))]
    pub async fn social_login(&self, login: &SocialLogin) -> Result<LoginOutcome, SpreeError> {
        let url = self.endpoint(&["auth", "social_login"])?;
        self.execute_json(self.post(url, login)).await
    }
}

/// Body of `POST payubiz/post_request_payubiz`.
#[derive(Serialize)]
struct PayuBizEnvelope<'a, P: ?Sized> {
    params: &'a P,
}

/// Parse a JSON body, logging an excerpt on failure.
fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, SpreeError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %excerpt(body),
            "Failed to parse Spree response"
        );
        SpreeError::Parse(e)
    })
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
