//! Session role carried in the token payload.

use serde::{Deserialize, Serialize};

/// Coarse permission tag from the `rol` claim.
///
/// Only `"user"` and `"admin"` carry meaning. Any other string is kept as
/// [`Role::Unrecognized`] so it can be displayed, but it satisfies neither the
/// user-area nor the admin-area check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Regular account, allowed into the user area.
    User,
    /// Moderator account, allowed into the admin area.
    Admin,
    /// Any other value; locked out of both role-specific areas.
    Unrecognized(String),
}

impl Role {
    /// Returns the wire value of the role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Unrecognized(raw) => raw,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self, Self::User)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "user" => Self::User,
            "admin" => Self::Admin,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "user" => Self::User,
            "admin" => Self::Admin,
            _ => Self::Unrecognized(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::User => "user".to_string(),
            Role::Admin => "admin".to_string(),
            Role::Unrecognized(raw) => raw,
        }
    }
}
