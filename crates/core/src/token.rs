//! Session token decoding.
//!
//! The session token is a `header.payload.signature` credential issued by the
//! backend. This module reads the payload for routing and display decisions
//! only. The signature is never checked here; the backend is the verifier.
//!
//! Every failure (wrong segment count, bad base64, bad JSON, missing claims)
//! collapses to `None` so callers treat the subject as unauthenticated.

use base64::Engine;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use secrecy::{ExposeSecret, SecretString};

use crate::types::SessionClaims;

/// Name of the cookie holding the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Standard-alphabet engine that tolerates non-zero trailing bits, matching
/// what browsers accept from `atob`.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Raw session credential as read from the cookie.
///
/// Wraps the value in a `SecretString` so it never shows up in `Debug`
/// output or log fields.
#[derive(Debug)]
pub struct SessionToken(SecretString);

impl SessionToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::from(raw.into()))
    }

    /// The raw credential, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Decode the payload of this token.
    #[must_use]
    pub fn claims(&self) -> Option<SessionClaims> {
        decode(self.expose())
    }
}

impl From<String> for SessionToken {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Decode the payload segment of a session token into claims.
///
/// Returns `None` for anything that is not a three-segment token whose
/// payload is base64url JSON carrying at least `usuario_id` and `rol`.
#[must_use]
pub fn decode(token: &str) -> Option<SessionClaims> {
    let bytes = payload_bytes(token)?;
    match serde_json::from_slice::<SessionClaims>(&bytes) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!(error = %e, "session token payload rejected");
            None
        }
    }
}

/// Decode the payload segment as untyped JSON.
///
/// Uses the same segment and base64 rules as [`decode`] but does not require
/// any claim to be present. Intended for diagnostics.
#[must_use]
pub fn decode_payload(token: &str) -> Option<serde_json::Value> {
    let bytes = payload_bytes(token)?;
    serde_json::from_slice(&bytes).ok()
}

fn payload_bytes(token: &str) -> Option<Vec<u8>> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        tracing::debug!("session token does not have three segments");
        return None;
    };

    let mut standard: String = payload
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let padded_len = standard.len().div_ceil(4) * 4;
    while standard.len() < padded_len {
        standard.push('=');
    }

    match PAYLOAD_ENGINE.decode(standard.as_bytes()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::debug!(error = %e, "session token payload is not base64");
            None
        }
    }
}
