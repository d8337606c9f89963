//! Allow/redirect decision for a single navigation.
//!
//! This is the pure half of the session gate: given what is known about the
//! session and the route class, pick the outcome. The gateway middleware does
//! the I/O (cookie, status check) and then asks [`evaluate`].

use serde::Serialize;

use crate::routes::{ADMIN_HOME, LOGIN_PATH, RouteClass, USER_HOME};
use crate::types::{Role, SessionClaims};

/// What the gate knows about the session when it decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState<'a> {
    /// No cookie, or a cookie that does not decode.
    NoToken,
    /// The backend reported the subject inactive or unauthorized.
    Revoked,
    /// A decoded token that was not revoked.
    Present(&'a SessionClaims),
}

impl<'a> SessionState<'a> {
    /// Build the state from an optional decode result.
    #[must_use]
    pub const fn from_claims(claims: Option<&'a SessionClaims>) -> Self {
        match claims {
            Some(claims) => Self::Present(claims),
            None => Self::NoToken,
        }
    }
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum GateDecision {
    /// Let the request through unchanged.
    Allow,
    /// Send to the login page, optionally deleting the session cookie.
    RedirectLogin { clear_cookie: bool },
    /// Send to the user landing page.
    RedirectHome,
    /// Send to the admin landing page.
    RedirectAdminHome,
}

impl GateDecision {
    /// Redirect target, or `None` for [`GateDecision::Allow`].
    #[must_use]
    pub const fn location(self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::RedirectLogin { .. } => Some(LOGIN_PATH),
            Self::RedirectHome => Some(USER_HOME),
            Self::RedirectAdminHome => Some(ADMIN_HOME),
        }
    }

    #[must_use]
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }

    #[must_use]
    pub const fn clears_cookie(self) -> bool {
        matches!(self, Self::RedirectLogin { clear_cookie: true })
    }

    /// Whether the redirect is caused by missing credentials rather than by
    /// a role mismatch.
    #[must_use]
    pub const fn is_unauthenticated(self) -> bool {
        matches!(self, Self::RedirectLogin { .. })
    }
}

/// Decide the outcome for one navigation.
///
/// The result depends only on the arguments, so evaluating an allowed request
/// again with the same session and route allows it again.
#[must_use]
pub fn evaluate(session: SessionState<'_>, class: RouteClass) -> GateDecision {
    match session {
        SessionState::NoToken => {
            if class.is_protected() {
                GateDecision::RedirectLogin {
                    clear_cookie: false,
                }
            } else {
                GateDecision::Allow
            }
        }
        SessionState::Revoked => GateDecision::RedirectLogin { clear_cookie: true },
        SessionState::Present(claims) => match class {
            RouteClass::Auth => role_home(&claims.role),
            RouteClass::Admin if !claims.role.is_admin() => GateDecision::RedirectHome,
            RouteClass::User if !claims.role.is_user() => GateDecision::RedirectAdminHome,
            _ => GateDecision::Allow,
        },
    }
}

/// Landing redirect for a logged-in subject that hit a login page.
fn role_home(role: &Role) -> GateDecision {
    if role.is_admin() {
        GateDecision::RedirectAdminHome
    } else {
        GateDecision::RedirectHome
    }
}
