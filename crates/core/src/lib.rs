//! MyEvent Core - Session and routing logic shared by every MyEvent component.
//!
//! This crate is used by:
//! - `gateway` - The HTTP gateway that enforces the session gate in front of pages
//! - `cli` - Command-line diagnostics for tokens, routes and the status check
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no sockets, no HTTP
//! clients. The gateway and the client-side session mirror both depend on it,
//! so they cannot disagree about how a token decodes or how a path classifies.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, roles and decoded session claims
//! - [`token`] - Unverified session token decoding
//! - [`routes`] - The route table and path classifier
//! - [`gate`] - Allow/redirect state machine for one navigation
//! - [`mirror`] - Client session mirror for conditional rendering

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod gate;
pub mod mirror;
pub mod routes;
pub mod token;
pub mod types;

pub use gate::{GateDecision, SessionState, evaluate};
pub use mirror::{CookieHeader, CookieSource, MirrorEvent, MirrorState, NavSet, SessionMirror};
pub use routes::{
    ADMIN_HOME, LOGIN_PATH, ROUTE_TABLE, RouteClass, RouteTable, USER_HOME, classify,
    normalize_path,
};
pub use token::{SessionToken, TOKEN_COOKIE, decode, decode_payload};
pub use types::*;
