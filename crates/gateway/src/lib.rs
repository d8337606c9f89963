//! MyEvent gateway library.
//!
//! The session and route authorization gate as an axum service, exposed as a
//! library so the binary, the CLI and the integration tests share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use axum::extract::Request;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router.
///
/// The gate wraps every route and the proxy fallback. The request span
/// declares the fields the gate fills in once it has decided.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_gate,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                route_class = tracing::field::Empty,
                user_id = tracing::field::Empty,
                role = tracing::field::Empty,
            )
        }))
        .with_state(state)
}
