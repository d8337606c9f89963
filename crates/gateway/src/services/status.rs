//! Remote session status check.
//!
//! Asks the backend whether the subject behind a session token is still
//! active. The backend answers `GET /check-status` with
//! `{ "data": { "activo": bool }, "message": "..." }`, or with `401`/`403`
//! when the session must be dropped.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use myevent_core::SessionToken;

/// Path of the status endpoint on the backend.
pub const STATUS_PATH: &str = "check-status";

/// Errors that leave the session status unknown.
#[derive(Debug, Error)]
pub enum StatusError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The call did not finish within the configured timeout.
    #[error("status check timed out after {0:?}")]
    Timeout(Duration),

    /// Backend answered with a status that says nothing about the session.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Success status with a body that is not the expected JSON.
    #[error("invalid response body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// Token cannot be sent as a header value.
    #[error("token is not a valid header value")]
    InvalidToken,
}

/// What the backend said about the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    /// The subject must be logged out.
    Inactive,
}

/// Summary of one status check as the gate sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Active,
    Inactive,
    /// Backend could not give an answer; see the failure policy.
    Unreachable,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    data: Option<StatusData>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    #[serde(default)]
    activo: Option<bool>,
}

/// Backend status endpoint client.
#[derive(Clone)]
pub struct StatusClient {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl StatusClient {
    /// Create a client for `{backend_url}/check-status`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(backend_url: &Url, timeout: Duration) -> Result<Self, StatusError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            url: status_url(backend_url),
            timeout,
        })
    }

    /// The full status endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Ask the backend about a session.
    ///
    /// # Errors
    ///
    /// Returns `StatusError` when the backend cannot be reached, times out,
    /// answers with anything other than success, `401` or `403`, or sends a
    /// success body that is not JSON.
    pub async fn check(&self, token: &SessionToken) -> Result<SessionStatus, StatusError> {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| StatusError::InvalidToken)?;

        let request = self
            .client
            .get(self.url.clone())
            .header(AUTHORIZATION, bearer)
            .header(ACCEPT, "application/json")
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| StatusError::Timeout(self.timeout))??;
        let status = response.status();

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(SessionStatus::Inactive);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StatusError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        let body: StatusBody = serde_json::from_slice(&bytes)?;

        match body.data.and_then(|data| data.activo) {
            Some(false) => {
                tracing::debug!(backend_message = ?body.message, "backend reports session inactive");
                Ok(SessionStatus::Inactive)
            }
            _ => Ok(SessionStatus::Active),
        }
    }

    /// Run [`StatusClient::check`] and fold failures into
    /// [`StatusOutcome::Unreachable`], logging them.
    pub async fn outcome(&self, token: &SessionToken) -> StatusOutcome {
        match self.check(token).await {
            Ok(SessionStatus::Active) => StatusOutcome::Active,
            Ok(SessionStatus::Inactive) => StatusOutcome::Inactive,
            Err(e) => {
                tracing::warn!(error = %e, url = %self.url, "session status check failed");
                StatusOutcome::Unreachable
            }
        }
    }
}

fn status_url(backend_url: &Url) -> Url {
    let mut url = backend_url.clone();
    url.path_segments_mut()
        .map(|mut segments| {
            segments.pop_if_empty().push(STATUS_PATH);
        })
        .ok();
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::http::HeaderMap;
    use axum::routing::get;
    use serde_json::json;

    use super::*;

    async fn spawn_backend(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn client(url: &Url) -> StatusClient {
        StatusClient::new(url, Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn test_status_url_joins_path() {
        let base = Url::parse("http://localhost:3001").unwrap();
        assert_eq!(status_url(&base).as_str(), "http://localhost:3001/check-status");

        let nested = Url::parse("http://api.local/v1/").unwrap();
        assert_eq!(status_url(&nested).as_str(), "http://api.local/v1/check-status");
    }

    #[tokio::test]
    async fn test_active_session() {
        let url = spawn_backend(Router::new().route(
            "/check-status",
            get(|headers: HeaderMap| async move {
                let auth = headers.get("authorization").unwrap().to_str().unwrap().to_string();
                assert_eq!(auth, "Bearer a.b.c");
                axum::Json(json!({"data": {"activo": true}}))
            }),
        ))
        .await;

        let status = client(&url).check(&SessionToken::new("a.b.c")).await.unwrap();
        assert_eq!(status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_inactive_flag() {
        let url = spawn_backend(Router::new().route(
            "/check-status",
            get(|| async { axum::Json(json!({"data": {"activo": false}, "message": "cuenta desactivada"})) }),
        ))
        .await;

        let status = client(&url).check(&SessionToken::new("a.b.c")).await.unwrap();
        assert_eq!(status, SessionStatus::Inactive);
    }

    #[tokio::test]
    async fn test_unauthorized_and_forbidden_are_inactive() {
        for code in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let url = spawn_backend(Router::new().route(
                "/check-status",
                get(move || async move { code }),
            ))
            .await;
            let status = client(&url).check(&SessionToken::new("a.b.c")).await.unwrap();
            assert_eq!(status, SessionStatus::Inactive, "{code}");
        }
    }

    #[tokio::test]
    async fn test_missing_flag_is_active() {
        let url = spawn_backend(Router::new().route(
            "/check-status",
            get(|| async { axum::Json(json!({"message": "ok"})) }),
        ))
        .await;
        let status = client(&url).check(&SessionToken::new("a.b.c")).await.unwrap();
        assert_eq!(status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_unparsable_body_is_unreachable() {
        let url = spawn_backend(Router::new().route("/check-status", get(|| async { "<html>" }))).await;

        let status_client = client(&url);
        let err = status_client.check(&SessionToken::new("a.b.c")).await.unwrap_err();
        assert!(matches!(err, StatusError::InvalidBody(_)));
        assert_eq!(
            status_client.outcome(&SessionToken::new("a.b.c")).await,
            StatusOutcome::Unreachable
        );
    }

    #[tokio::test]
    async fn test_server_error_is_unreachable() {
        let url = spawn_backend(Router::new().route(
            "/check-status",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;

        let status_client = client(&url);
        let err = status_client.check(&SessionToken::new("a.b.c")).await.unwrap_err();
        assert!(matches!(err, StatusError::Api { status: 500, .. }));
        assert_eq!(
            status_client.outcome(&SessionToken::new("a.b.c")).await,
            StatusOutcome::Unreachable
        );
    }

    #[tokio::test]
    async fn test_timeout_is_unreachable() {
        let url = spawn_backend(Router::new().route(
            "/check-status",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;

        let status_client = StatusClient::new(&url, Duration::from_millis(100)).unwrap();
        assert_eq!(
            status_client.outcome(&SessionToken::new("a.b.c")).await,
            StatusOutcome::Unreachable
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}")).unwrap();
        assert_eq!(
            client(&url).outcome(&SessionToken::new("a.b.c")).await,
            StatusOutcome::Unreachable
        );
    }
}
