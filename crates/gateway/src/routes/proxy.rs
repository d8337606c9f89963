//! Fallback handler: forward allowed navigations to the page server.

use axum::extract::{Request, State};
use axum::response::Response;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Forward the request unchanged (minus hop-by-hop headers).
///
/// # Errors
///
/// Returns `AppError::Upstream` (502) if the page server cannot be reached,
/// or `AppError::BadRequest` if the request body cannot be read.
pub async fn forward(State(state): State<AppState>, request: Request) -> Result<Response> {
    state
        .upstream()
        .forward(request)
        .await
        .map_err(AppError::from_forward)
}
