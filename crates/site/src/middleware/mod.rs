//! HTTP middleware stack for the site.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with in-memory store)
//! 5. Rate limiting on `/unlock` and `/edit/login` (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{AuthRejection, RequireEditor, RequireUnlocked};
pub use rate_limit::{edit_login_rate_limiter, unlock_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
