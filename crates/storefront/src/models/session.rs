//! Session-related types.
//!
//! Types stored in the shopper's session between requests.

use serde::{Deserialize, Serialize};

use spree_storefront_core::{Email, UserId};

use crate::spree::User;

/// Session-stored shopper identity.
///
/// Written when Spree reports the shopper as signed in. Its email is the one
/// used to sign payment requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Spree user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the signed-in shopper.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for storing the current order number and token.
    pub const ORDER: &str = "order";
}
