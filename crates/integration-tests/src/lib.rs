//! Test harness for the MyEvent gateway.
//!
//! Each test gets its own in-process setup, all bound to `127.0.0.1:0`:
//!
//! - a mock REST backend answering `GET /check-status`,
//! - a mock page server that echoes what it received,
//! - the real gateway router in front of the page server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p myevent-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Client;
use serde_json::json;
use url::Url;

use myevent_gateway::config::GatewayConfig;
use myevent_gateway::state::AppState;

/// Header the mock page server sets on every response.
pub const UPSTREAM_MARKER: &str = "x-mock-upstream";

/// How the mock backend answers the status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// `200 {"data": {"activo": true}}`
    Active,
    /// `200 {"data": {"activo": false}}`
    Inactive,
    /// `401`
    Unauthorized,
    /// `500`
    Error,
    /// Sleeps past the gateway's timeout.
    Slow,
    /// Nothing listens on the port.
    Down,
}

/// Mock REST backend.
pub struct MockBackend {
    pub url: Url,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub async fn spawn(mode: BackendMode) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));

        if mode == BackendMode::Down {
            return Self {
                url: unused_port_url().await,
                calls,
            };
        }

        let router = Router::new()
            .route("/check-status", get(check_status))
            .with_state((mode, Arc::clone(&calls)));

        Self {
            url: serve(router).await,
            calls,
        }
    }

    /// Number of status checks received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn check_status(
    State((mode, calls)): State<(BackendMode, Arc<AtomicUsize>)>,
    headers: HeaderMap,
) -> Response {
    calls.fetch_add(1, Ordering::SeqCst);

    if !headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer "))
    {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match mode {
        BackendMode::Active => axum::Json(json!({"data": {"activo": true}})).into_response(),
        BackendMode::Inactive => {
            axum::Json(json!({"data": {"activo": false}, "message": "Usuario inactivo"}))
                .into_response()
        }
        BackendMode::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        BackendMode::Error | BackendMode::Down => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        BackendMode::Slow => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            axum::Json(json!({"data": {"activo": true}})).into_response()
        }
    }
}

/// Page server stand-in: answers every request with
/// `"{method} {path_and_query}"` followed by the body it received.
async fn echo(request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_else(|_| Bytes::new());
    let forwarded_host = parts
        .headers
        .get("x-forwarded-host")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let text = format!(
        "{} {}\n{}",
        parts.method,
        parts.uri.path_and_query().map_or("/", |pq| pq.as_str()),
        String::from_utf8_lossy(&body)
    );

    (
        [
            (UPSTREAM_MARKER, "pages".to_string()),
            ("x-seen-forwarded-host", forwarded_host),
        ],
        text,
    )
        .into_response()
}

async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server error");
    });
    url_for(addr)
}

async fn unused_port_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read address");
    drop(listener);
    url_for(addr)
}

fn url_for(addr: SocketAddr) -> Url {
    Url::parse(&format!("http://{addr}")).expect("Failed to build URL")
}

/// Knobs for one gateway instance.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub backend: BackendMode,
    pub status_check: bool,
    pub policy: &'static str,
    /// Point the gateway at a port nobody listens on.
    pub upstream_down: bool,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            backend: BackendMode::Active,
            status_check: true,
            policy: "fail-open",
            upstream_down: false,
        }
    }
}

/// A running gateway with its mocks.
pub struct TestGateway {
    pub url: Url,
    pub upstream_url: Url,
    pub backend: MockBackend,
    pub client: Client,
}

impl TestGateway {
    /// Start with an active backend and default settings.
    pub async fn start() -> Self {
        Self::start_with(GatewayOptions::default()).await
    }

    pub async fn start_with(options: GatewayOptions) -> Self {
        let backend = MockBackend::spawn(options.backend).await;
        let upstream_url = if options.upstream_down {
            unused_port_url().await
        } else {
            serve(Router::new().fallback(echo)).await
        };

        let vars: HashMap<&str, String> = HashMap::from([
            ("GATEWAY_UPSTREAM_URL", upstream_url.to_string()),
            ("GATEWAY_BACKEND_URL", backend.url.to_string()),
            ("GATEWAY_STATUS_CHECK", options.status_check.to_string()),
            ("GATEWAY_STATUS_TIMEOUT_MS", "300".to_string()),
            ("GATEWAY_STATUS_POLICY", options.policy.to_string()),
        ]);
        let config = GatewayConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("Failed to load configuration");
        let state = AppState::new(config).expect("Failed to initialize application state");
        let url = serve(myevent_gateway::app(state)).await;

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            url,
            upstream_url,
            backend,
            client,
        }
    }

    /// `GET path`, optionally carrying a `token` cookie.
    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        self.send(self.client.get(self.at(path)), token).await
    }

    /// `POST path` with a form body, optionally carrying a `token` cookie.
    pub async fn post(&self, path: &str, body: &str, token: Option<&str>) -> reqwest::Response {
        let request = self
            .client
            .post(self.at(path))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body.to_string());
        self.send(request, token).await
    }

    fn at(&self, path: &str) -> String {
        format!("{}{}", self.url.as_str().trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> reqwest::Response {
        let request = match token {
            Some(token) => request.header("cookie", format!("token={token}")),
            None => request,
        };
        request.send().await.expect("Failed to reach gateway")
    }
}

/// Build an unsigned token carrying the given claims.
#[must_use]
pub fn token(user_id: i64, role: &str, nickname: Option<&str>) -> String {
    let mut payload = json!({"usuario_id": user_id, "rol": role, "iat": 1_700_000_000});
    if let Some(nickname) = nickname {
        payload["apodo"] = json!(nickname);
    }
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// Redirect target of a response, if any.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
}

/// Whether the response deletes the `token` cookie.
#[must_use]
pub fn clears_token(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| {
            value.starts_with("token=") && (value.contains("Max-Age=0") || value.contains("Expires="))
        })
}

/// Whether the response came from the mock page server.
#[must_use]
pub fn from_upstream(response: &reqwest::Response) -> bool {
    response.headers().contains_key(UPSTREAM_MARKER)
}
