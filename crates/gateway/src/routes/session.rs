//! `/api/session`: the session as the client mirror sees it.
//!
//! Lets pages that cannot read the cookie (or should not) learn the role and
//! nickname for rendering. Informational only; it never returns the token.

use axum::Json;
use serde::Serialize;

use myevent_core::{MirrorState, NavSet, SessionClaims};

use crate::middleware::OptionalSession;

/// Response body for `GET /api/session`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user: Option<SessionClaims>,
    pub is_authenticated: bool,
    pub nav: NavSet,
}

impl From<MirrorState> for SessionView {
    fn from(state: MirrorState) -> Self {
        Self {
            is_authenticated: state.is_authenticated(),
            nav: state.nav(),
            user: state.user,
        }
    }
}

/// Show the decoded session of the current request.
pub async fn show(OptionalSession(claims): OptionalSession) -> Json<SessionView> {
    Json(MirrorState::from_claims(claims).into())
}
