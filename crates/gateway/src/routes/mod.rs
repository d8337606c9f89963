//! HTTP routes served by the gateway itself.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (upstream reachable)
//! GET  /api/session            - Mirror view of the session cookie
//! *    (anything else)         - Forwarded to the page server
//! ```
//!
//! Every route, the fallback included, sits behind the session gate.

pub mod health;
pub mod proxy;
pub mod session;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create the gateway's own routes plus the proxy fallback.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/session", get(session::show))
        .fallback(proxy::forward)
}
