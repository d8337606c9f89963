//! Application state shared across handlers and the gate middleware.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::services::{StatusClient, StatusError, UpstreamClient, UpstreamError};

/// Error creating the outbound HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("status client: {0}")]
    Status(#[from] StatusError),
    #[error("upstream client: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Nothing in it changes after
/// start-up, so concurrent gate evaluations never share mutable data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GatewayConfig,
    status: StatusClient,
    upstream: UpstreamClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, StateError> {
        let status = StatusClient::new(&config.backend_url, config.status_check.timeout)?;
        let upstream = UpstreamClient::new(&config.upstream_url)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                status,
                upstream,
            }),
        })
    }

    /// Get a reference to the gateway configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Get a reference to the backend status client.
    #[must_use]
    pub fn status(&self) -> &StatusClient {
        &self.inner.status
    }

    /// Get a reference to the upstream page server client.
    #[must_use]
    pub fn upstream(&self) -> &UpstreamClient {
        &self.inner.upstream
    }
}
