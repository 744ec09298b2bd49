//! Order token storage.
//!
//! The `{order_number, order_token}` pair is the only credential a shopper
//! holds for an in-progress order. It is scoped to one shopper session and a
//! session holds at most one: `set` overwrites, `clear` forgets.
//!
//! # Implementations
//!
//! - [`SessionTokenStore`] - per-shopper `tower-sessions` storage (production)
//! - [`MemoryTokenStore`] - in-process storage for tests and tools
//! - [`DetachedTokenStore`] - no storage at all, for requests without a shopper session

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use spree_storefront_core::{OrderNumber, OrderToken};
use thiserror::Error;
use tokio::sync::RwLock;
use tower_sessions::Session;

use crate::models::session_keys;
use crate::spree::Order;

/// Stored association between a shopper session and its current order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTokenRecord {
    pub order_number: OrderNumber,
    pub order_token: OrderToken,
}

impl From<&Order> for OrderTokenRecord {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.number.clone(),
            order_token: order.token.clone(),
        }
    }
}

/// Errors raised by a token store backend.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// The session backend failed to load or persist the record.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Storage for the current order token of one shopper session.
pub trait OrderTokenStore: Send + Sync {
    /// Current record, or `None` if the session has no order.
    ///
    /// Backend read failures are logged and treated as "no order".
    fn get(&self) -> impl Future<Output = Option<OrderTokenRecord>> + Send;

    /// Replace the current record.
    fn set(&self, record: OrderTokenRecord)
    -> impl Future<Output = Result<(), TokenStoreError>> + Send;

    /// Forget the current record.
    fn clear(&self) -> impl Future<Output = Result<(), TokenStoreError>> + Send;
}

// =============================================================================
// SessionTokenStore
// =============================================================================

/// Token store backed by the shopper's `tower-sessions` session.
#[derive(Clone)]
pub struct SessionTokenStore {
    session: Session,
}

impl SessionTokenStore {
    /// Wrap a request's session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl OrderTokenStore for SessionTokenStore {
    async fn get(&self) -> Option<OrderTokenRecord> {
        match self
            .session
            .get::<OrderTokenRecord>(session_keys::ORDER)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read order token from session");
                None
            }
        }
    }

    async fn set(&self, record: OrderTokenRecord) -> Result<(), TokenStoreError> {
        self.session.insert(session_keys::ORDER, record).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        self.session
            .remove::<OrderTokenRecord>(session_keys::ORDER)
            .await?;
        Ok(())
    }
}

// =============================================================================
// MemoryTokenStore
// =============================================================================

/// In-memory token store.
///
/// Counts writes so callers can assert that an operation left storage alone.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    inner: Arc<MemoryTokenStoreInner>,
}

#[derive(Default)]
struct MemoryTokenStoreInner {
    record: RwLock<Option<OrderTokenRecord>>,
    writes: AtomicUsize,
    clears: AtomicUsize,
}

impl MemoryTokenStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `record`.
    #[must_use]
    pub fn with_record(record: OrderTokenRecord) -> Self {
        Self {
            inner: Arc::new(MemoryTokenStoreInner {
                record: RwLock::new(Some(record)),
                ..MemoryTokenStoreInner::default()
            }),
        }
    }

    /// Number of `set` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Number of `clear` calls so far.
    #[must_use]
    pub fn clears(&self) -> usize {
        self.inner.clears.load(Ordering::SeqCst)
    }
}

impl OrderTokenStore for MemoryTokenStore {
    async fn get(&self) -> Option<OrderTokenRecord> {
        self.inner.record.read().await.clone()
    }

    async fn set(&self, record: OrderTokenRecord) -> Result<(), TokenStoreError> {
        *self.inner.record.write().await = Some(record);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        *self.inner.record.write().await = None;
        self.inner.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// DetachedTokenStore
// =============================================================================

/// Token store for contexts without a shopper session.
///
/// Always empty; writes are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedTokenStore;

impl OrderTokenStore for DetachedTokenStore {
    async fn get(&self) -> Option<OrderTokenRecord> {
        None
    }

    async fn set(&self, _record: OrderTokenRecord) -> Result<(), TokenStoreError> {
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_sessions::MemoryStore;

    use super::*;

    fn record(number: &str, token: &str) -> OrderTokenRecord {
        OrderTokenRecord {
            order_number: OrderNumber::new(number),
            order_token: OrderToken::new(token),
        }
    }

    #[tokio::test]
    async fn test_memory_store_set_overwrites() {
        let store = MemoryTokenStore::new();
        assert!(store.get().await.is_none());

        store.set(record("R1", "t1")).await.unwrap();
        store.set(record("R2", "t2")).await.unwrap();

        assert_eq!(store.get().await, Some(record("R2", "t2")));
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_memory_store_clear() {
        let store = MemoryTokenStore::with_record(record("R1", "t1"));
        assert_eq!(store.writes(), 0);

        store.clear().await.unwrap();
        assert!(store.get().await.is_none());
        assert_eq!(store.clears(), 1);
    }

    #[tokio::test]
    async fn test_detached_store_is_always_empty() {
        let store = DetachedTokenStore;
        store.set(record("R1", "t1")).await.unwrap();
        assert!(store.get().await.is_none());
    }

    #[tokio::test]
    async fn test_session_store_roundtrip() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let store = SessionTokenStore::new(session.clone());

        assert!(store.get().await.is_none());
        store.set(record("R9", "t9")).await.unwrap();
        assert_eq!(store.get().await, Some(record("R9", "t9")));

        // Same session seen through another handle
        let other = SessionTokenStore::new(session);
        assert_eq!(other.get().await, Some(record("R9", "t9")));

        store.clear().await.unwrap();
        assert!(other.get().await.is_none());
    }
}
