//! Outbound HTTP services used by the gateway.
//!
//! # Services
//!
//! - `status` - Remote session status check against the backend
//! - `upstream` - Forwarding of allowed requests to the page server

pub mod status;
pub mod upstream;

pub use status::{SessionStatus, StatusClient, StatusError, StatusOutcome};
pub use upstream::{UpstreamClient, UpstreamError};
