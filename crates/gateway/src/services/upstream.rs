//! Forwarding of allowed requests to the page server.

use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::response::Response;
use thiserror::Error;
use url::Url;

/// Largest request body the gateway buffers before forwarding.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Connection-scoped headers that must not cross the proxy.
const HOP_BY_HOP: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Errors that can occur while forwarding.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP request to the upstream failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The incoming body could not be read.
    #[error("request body error: {0}")]
    Body(String),
}

/// Client for the upstream page server.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base: Url,
}

impl UpstreamClient {
    /// Create a client for the given upstream.
    ///
    /// Redirects are not followed; the browser sees them as the upstream sent them.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base: &Url) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base: base.clone(),
        })
    }

    /// Absolute upstream URL for a request path and query.
    ///
    /// The path is appended to the base path verbatim; it is never resolved
    /// as a relative reference, so it cannot change the upstream host. The
    /// gate has already normalized it, so what is forwarded is what was
    /// classified.
    #[must_use]
    pub fn target(&self, path_and_query: &str) -> Url {
        let (path, query) = path_and_query
            .split_once('?')
            .map_or((path_and_query, None), |(path, query)| (path, Some(query)));

        let mut url = self.base.clone();
        let separator = if path.starts_with('/') { "" } else { "/" };
        let joined = format!("{}{separator}{path}", url.path().trim_end_matches('/'));
        url.set_path(&joined);
        url.set_query(query);
        url
    }

    /// Forward a request and relay the upstream response.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError` if the body cannot be read or the upstream
    /// cannot be reached.
    pub async fn forward(&self, request: Request) -> Result<Response, UpstreamError> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or("/", axum::http::uri::PathAndQuery::as_str);
        let target = self.target(path_and_query);

        let body = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| UpstreamError::Body(e.to_string()))?;

        let mut headers = strip_hop_by_hop(parts.headers);
        if let Some(host) = headers.remove(header::HOST) {
            headers.insert(HeaderName::from_static("x-forwarded-host"), host);
        }
        headers.remove(header::CONTENT_LENGTH);

        tracing::debug!(method = %parts.method, %target, "forwarding to upstream");
        let upstream = self
            .client
            .request(parts.method, target)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = upstream.status();
        let headers = strip_hop_by_hop(upstream.headers().clone());

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }

    /// Whether the upstream answers at all.
    pub async fn ping(&self) -> bool {
        match self.client.head(self.base.clone()).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, upstream = %self.base, "upstream not reachable");
                false
            }
        }
    }
}

fn strip_hop_by_hop(mut headers: HeaderMap) -> HeaderMap {
    // Headers named in `Connection` are hop-by-hop too
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in HOP_BY_HOP.iter().chain(named.iter()) {
        headers.remove(name);
    }
    headers.remove(HeaderName::from_static("keep-alive"));
    headers
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_target_joins_path_and_query() {
        let client = UpstreamClient::new(&Url::parse("http://127.0.0.1:4000").unwrap()).unwrap();
        assert_eq!(
            client.target("/misEventos?page=2").as_str(),
            "http://127.0.0.1:4000/misEventos?page=2"
        );
        assert_eq!(client.target("/").as_str(), "http://127.0.0.1:4000/");
    }

    #[test]
    fn test_target_keeps_base_path() {
        let client = UpstreamClient::new(&Url::parse("http://pages.local/app").unwrap()).unwrap();
        assert_eq!(
            client.target("/evento/3").as_str(),
            "http://pages.local/app/evento/3"
        );
    }

    #[test]
    fn test_target_does_not_rewrite_path() {
        let client = UpstreamClient::new(&Url::parse("http://127.0.0.1:4000").unwrap()).unwrap();
        assert_eq!(
            client.target("/evento%2F3?q=a%20b").as_str(),
            "http://127.0.0.1:4000/evento%2F3?q=a%20b"
        );
        assert_eq!(client.target("misEventos").as_str(), "http://127.0.0.1:4000/misEventos");
    }

    #[test]
    fn test_target_cannot_change_host() {
        let client = UpstreamClient::new(&Url::parse("http://127.0.0.1:4000").unwrap()).unwrap();
        let target = client.target("//evil.example/x");
        assert_eq!(target.host_str(), Some("127.0.0.1"));
        let target = client.target("/javascript:alert(1)");
        assert_eq!(target.host_str(), Some("127.0.0.1"));
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        headers.insert(HeaderName::from_static("x-trace"), HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::COOKIE, HeaderValue::from_static("token=a.b.c"));

        let headers = strip_hop_by_hop(headers);
        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("x-trace").is_none());
        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(headers.get(header::COOKIE).unwrap(), "token=a.b.c");
    }
}
