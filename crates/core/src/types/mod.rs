//! Core types for MyEvent sessions.
//!
//! This module provides type-safe wrappers for the data carried in a session token.

pub mod claims;
pub mod id;
pub mod role;

pub use claims::SessionClaims;
pub use id::*;
pub use role::Role;
