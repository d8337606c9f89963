//! Remote status check.

use std::io::Write;
use std::time::Duration;

use url::Url;

use myevent_core::SessionToken;
use myevent_gateway::services::{SessionStatus, StatusClient};

use super::CommandError;

const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// Ask the backend about a token and print the answer.
///
/// Without `--backend`, uses `GATEWAY_BACKEND_URL` (from the environment or
/// `.env`) and then the local default.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached or answers with an
/// unexpected status.
pub async fn check(
    out: &mut impl Write,
    token: &str,
    backend: Option<Url>,
    timeout_ms: u64,
) -> Result<(), CommandError> {
    let backend = match backend {
        Some(url) => url,
        None => {
            dotenvy::dotenv().ok();
            let raw = std::env::var("GATEWAY_BACKEND_URL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
            Url::parse(&raw)?
        }
    };

    let client = StatusClient::new(&backend, Duration::from_millis(timeout_ms))?;
    tracing::info!(url = %client.url(), "checking session status");

    let status = client.check(&SessionToken::new(token)).await?;
    let label = match status {
        SessionStatus::Active => "active",
        SessionStatus::Inactive => "inactive (the gateway would clear the cookie)",
    };
    writeln!(out, "{label}")?;
    Ok(())
}
