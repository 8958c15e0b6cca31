//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded in the span)
//! 4. CORS
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting on `/api/auth` and `/api/shop` (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{
    OptionalUser, RequireAdmin, RequireAgent, RequireUser, clear_current_user, set_current_user,
};
pub use rate_limit::{auth_rate_limiter, shop_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::{create_session_layer, session_layer};
