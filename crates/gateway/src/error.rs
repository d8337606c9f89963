//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. The gate itself never produces an
//! `AppError`: every gate outcome is an allow or a redirect. Errors here come
//! from the proxy and the gateway's own endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::UpstreamError;

/// Application-level error type for the gateway.
#[derive(Debug, Error)]
pub enum AppError {
    /// Forwarding to the page server failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Classify a forwarding failure: unreadable bodies are the client's fault.
    #[must_use]
    pub fn from_forward(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Body(msg) => Self::BadRequest(msg),
            other => Self::Upstream(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Upstream(_) => "Page server unavailable".to_string(),
            Self::BadRequest(_) => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from the session subject.
///
/// Called by the gate once a navigation is allowed, so errors further down
/// the request are associated with the user.
pub fn set_sentry_user(user_id: &impl ToString, nickname: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: nickname.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb describing a gate decision.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of
/// navigations leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
