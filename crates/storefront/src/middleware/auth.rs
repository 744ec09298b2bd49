//! Shopper identity extractors.
//!
//! The signed-in shopper is cached in the session after Spree confirms it
//! (see the `/auth` routes). These extractors read it back.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::checkout::CheckoutError;
use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

async fn load_current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read current user from session");
            None
        }
    }
}

/// Extractor that requires a signed-in shopper.
///
/// Rejects with `401` and an error notice otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn pay(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Paying as {}", user.email)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        load_current_user(parts)
            .await
            .map(Self)
            .ok_or(AppError::Checkout(CheckoutError::MissingCustomerEmail))
    }
}

/// Store the signed-in shopper in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Forget the signed-in shopper.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
