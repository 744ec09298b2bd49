//! Authentication route handlers.
//!
//! Spree owns shopper accounts. These handlers ask Spree who the shopper is
//! and cache the answer in the session, where checkout reads the email used
//! to sign payments.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
};
use tower_sessions::Session;
use tracing::instrument;

use super::ApiResponse;
use crate::checkout::SessionTokenStore;
use crate::error::{Result, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::spree::{Authorization, LoginOutcome, SocialLogin};
use crate::state::AppState;

/// Bearer token from the request's `Authorization` header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn remember_user(session: &Session, user: CurrentUser) -> Result<()> {
    set_current_user(session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Whether the shopper is signed in.
///
/// Unauthorized answers are a normal result, not an error.
#[instrument(skip(state, session, headers))]
pub async fn authorized(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<ApiResponse<Authorization>> {
    let authorization = state.spree().authorization(bearer_token(&headers)).await?;

    match &authorization {
        Authorization::Authorized { user } => {
            remember_user(&session, CurrentUser::from(user.clone())).await?;
        }
        Authorization::Unauthorized => clear_current_user(&session).await?,
    }

    Ok(ApiResponse::new(authorization))
}

/// Exchange a social provider code for a Spree login.
///
/// A deferred outcome leaves the session untouched.
#[instrument(skip(state, session, login), fields(provider = %login.provider))]
pub async fn social_login(
    State(state): State<AppState>,
    session: Session,
    Json(login): Json<SocialLogin>,
) -> Result<ApiResponse<LoginOutcome>> {
    let outcome = state.spree().social_login(&login).await?;

    match &outcome {
        LoginOutcome::LoggedIn { user } => {
            tracing::info!(user = %user.id, "Shopper signed in");
            remember_user(&session, CurrentUser::from(user.clone())).await?;
        }
        LoginOutcome::Deferred { message } => {
            tracing::info!(message = ?message, "Social login deferred");
        }
    }

    Ok(ApiResponse::new(outcome))
}

/// Sign out and forget the session's cart.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<ApiResponse<()>> {
    clear_current_user(&session).await?;
    let store = SessionTokenStore::new(session);
    state.orders().remove_local_order(&store).await?;
    Ok(ApiResponse::new(()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
