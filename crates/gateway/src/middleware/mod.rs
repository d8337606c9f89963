//! HTTP middleware for the gateway.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, one hub per request)
//! 2. `TraceLayer` (request span with `route_class`, `user_id`, `role`)
//! 3. Session gate (classify, decode, status check, decide)

pub mod gate;
pub mod session;

pub use gate::session_gate;
pub use session::{CurrentSession, OptionalSession};
