//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Path normalization (trailing slashes)
//! 2. Sentry layers (capture errors, transactions)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Session layer (tower-sessions with a moka-backed store)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{RequireUser, clear_current_user, set_current_user};
pub use request_id::{RequestId, request_id_middleware};
pub use session::create_session_layer;
