//! Decoded session token payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Role, UserId};

/// Fields read from the payload segment of the session token.
///
/// `usuario_id` and `rol` are required; a payload without them fails to
/// deserialize and the token is treated as absent. `role` is accepted as an
/// alias for `rol`. Serializes back with the backend's field names so the
/// session endpoint exposes the same shape clients already know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject identifier.
    #[serde(rename = "usuario_id")]
    pub user_id: UserId,
    /// Display nickname.
    #[serde(rename = "apodo", default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Permission tag.
    #[serde(rename = "rol", alias = "role")]
    pub role: Role,
    /// Issued-at, seconds since the Unix epoch. Informational only.
    #[serde(rename = "iat", default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
}

impl SessionClaims {
    /// Issued-at as a UTC timestamp, if present and in range.
    #[must_use]
    pub fn issued_at_utc(&self) -> Option<DateTime<Utc>> {
        self.issued_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    /// Nickname for display, falling back to the subject id.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.nickname
            .clone()
            .unwrap_or_else(|| format!("#{}", self.user_id))
    }
}
