//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response goes out; the shopper gets an
//! error notice, never internal details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::checkout::{CheckoutError, Notice};
use crate::spree::SpreeError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart or checkout operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Direct Spree call failed.
    #[error("Spree error: {0}")]
    Spree(#[from] SpreeError),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    notice: Notice,
}

fn spree_status(err: &SpreeError) -> StatusCode {
    match err {
        SpreeError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        SpreeError::NotFound(_) => StatusCode::NOT_FOUND,
        SpreeError::Api { status, .. } if *status == 422 => StatusCode::UNPROCESSABLE_ENTITY,
        SpreeError::Http(_) | SpreeError::Api { .. } | SpreeError::Parse(_) => {
            StatusCode::BAD_GATEWAY
        }
        SpreeError::Url(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(err) => match err {
                CheckoutError::Spree(e) => spree_status(e),
                CheckoutError::NoCurrentOrder => StatusCode::NOT_FOUND,
                CheckoutError::MissingCustomerEmail => StatusCode::UNAUTHORIZED,
                CheckoutError::MissingBillingAddress(_)
                | CheckoutError::InvalidPaymentField(_) => StatusCode::BAD_REQUEST,
                CheckoutError::AlreadyConfirmed => StatusCode::CONFLICT,
                CheckoutError::EmptyOrder(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::TokenStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Spree(e) => spree_status(e),
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show the shopper.
    fn public_message(&self) -> String {
        match self {
            Self::Checkout(CheckoutError::NoCurrentOrder) => "Your cart is empty".to_string(),
            Self::Checkout(CheckoutError::MissingCustomerEmail) => {
                "Please sign in to continue".to_string()
            }
            Self::Checkout(CheckoutError::MissingBillingAddress(_)) => {
                "Please add a billing address".to_string()
            }
            Self::Checkout(CheckoutError::InvalidPaymentField(_)) => {
                "Please remove '|' from your billing name".to_string()
            }
            Self::Checkout(CheckoutError::AlreadyConfirmed) => {
                "This order is already confirmed".to_string()
            }
            Self::BadRequest(_) => self.to_string(),
            _ => "Failed".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = ErrorBody {
            notice: Notice::error("Something went wrong!", self.public_message()),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for a signed-in shopper.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Record a checkout step as a Sentry breadcrumb.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use spree_storefront_core::OrderNumber;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid order reference".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid order reference");
    }

    #[test]
    fn test_checkout_error_status_codes() {
        assert_eq!(
            get_status(CheckoutError::NoCurrentOrder.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CheckoutError::MissingCustomerEmail.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(CheckoutError::MissingBillingAddress(OrderNumber::new("R1")).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::InvalidPaymentField("firstname").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::AlreadyConfirmed.into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_spree_error_status_codes() {
        assert_eq!(
            get_status(SpreeError::Unauthorized(401).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(
                SpreeError::Api {
                    status: 422,
                    body: "invalid".to_string()
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(
                SpreeError::Api {
                    status: 500,
                    body: "boom".to_string()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(CheckoutError::Spree(SpreeError::NotFound("x".to_string())).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_error_body_hides_internal_details() {
        let response = AppError::Spree(SpreeError::Api {
            status: 500,
            body: "db password leaked".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["notice"]["level"], "error");
        assert_eq!(body["notice"]["message"], "Failed");
        assert!(!body.to_string().contains("password"));
    }
}
