//! Subcommand implementations.
//!
//! Each command writes its report to the given writer so it can be tested
//! without a terminal.

pub mod routes;
pub mod session;
pub mod status;

use thiserror::Error;

/// Errors a command can fail with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Status(#[from] myevent_gateway::services::StatusError),

    #[error("route table overlap: {0}")]
    Overlap(#[from] myevent_core::routes::OverlapError),
}
