//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. Session layer (tower-sessions with `PostgreSQL` store)
//! 3. Request ID (reuse or generate `x-request-id`)
//! 4. `TraceLayer` (request span carrying the request ID)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{AuthHook, SessionOwner, clear_current_owner, set_current_owner};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{create_session_layer, with_session_cookie};
