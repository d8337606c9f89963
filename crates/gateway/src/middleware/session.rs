//! Session extractors for handlers behind the gate.
//!
//! The gate decodes the `token` cookie once and stores the claims in the
//! request extensions; handlers read them back through these extractors
//! instead of decoding the cookie again.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use myevent_core::SessionClaims;

/// Claims of the session the gate let through.
///
/// Present in the request extensions only when the request carried a
/// decodable token and the gate allowed it.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionClaims);

/// Extractor that optionally gets the current session.
///
/// Never rejects: guests get `None`.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalSession(session): OptionalSession) -> String {
///     match session {
///         Some(claims) => format!("Hola, {}", claims.display_name()),
///         None => "Hola".to_string(),
///     }
/// }
/// ```
pub struct OptionalSession(pub Option<SessionClaims>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<CurrentSession>()
            .map(|CurrentSession(claims)| claims.clone());

        Ok(Self(claims))
    }
}
