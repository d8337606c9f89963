//! Client session mirror.
//!
//! A non-authoritative view of the session token for conditional rendering:
//! which navigation to show, whose nickname to greet. It decodes the cookie
//! with the same [`crate::token::decode`] the gateway uses, so both sides see
//! the same role, but it verifies nothing. Never use it to decide whether data
//! may be shown; the gateway is the enforcement point.
//!
//! The mirror is an explicit store. Build one per application instance and
//! hand it to whatever renders; subscribers get every state change through a
//! `tokio::sync::watch` channel.
//!
//! ```
//! use myevent_core::{CookieHeader, MirrorEvent, SessionMirror};
//!
//! let mirror = SessionMirror::new(CookieHeader::new("theme=dark"));
//! assert!(mirror.snapshot().loading);
//!
//! mirror.mount();
//! let state = mirror.snapshot();
//! assert!(!state.loading);
//! assert!(!state.is_authenticated());
//!
//! mirror.handle(MirrorEvent::Focus);
//! ```

use serde::Serialize;
use tokio::sync::watch;

use crate::token::{self, TOKEN_COOKIE};
use crate::types::{Role, SessionClaims};

/// Somewhere the mirror can read cookies from.
pub trait CookieSource: Send + Sync {
    /// Current value of the named cookie, already percent-decoded.
    fn cookie(&self, name: &str) -> Option<String>;
}

impl<F> CookieSource for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn cookie(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// A `Cookie:` header (or `document.cookie`) string.
#[derive(Debug, Clone, Default)]
pub struct CookieHeader(String);

impl CookieHeader {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl CookieSource for CookieHeader {
    fn cookie(&self, name: &str) -> Option<String> {
        self.0
            .split(';')
            .map(str::trim_start)
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == name)
            .and_then(|(_, value)| urlencoding::decode(value).ok())
            .map(std::borrow::Cow::into_owned)
    }
}

/// Browser lifecycle events that trigger a re-read of the cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorEvent {
    /// The window regained focus.
    Focus,
    /// The document visibility changed (tab switched back).
    VisibilityChange,
}

/// Which navigation set the UI should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavSet {
    Guest,
    User,
    Admin,
}

impl NavSet {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Snapshot published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorState {
    /// Decoded claims, if the cookie held a readable token.
    pub user: Option<SessionClaims>,
    /// True while a read is in progress, and before the first mount.
    pub loading: bool,
}

impl MirrorState {
    /// State derived from an optional set of claims, not loading.
    #[must_use]
    pub const fn from_claims(user: Option<SessionClaims>) -> Self {
        Self {
            user,
            loading: false,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn role(&self) -> Option<&Role> {
        self.user.as_ref().map(|claims| &claims.role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(Role::is_admin)
    }

    /// Navigation set for the header/sidebar.
    ///
    /// Subjects with an unrecognized role get the user navigation; the
    /// gateway keeps them out of the pages regardless.
    #[must_use]
    pub fn nav(&self) -> NavSet {
        match self.role() {
            None => NavSet::Guest,
            Some(Role::Admin) => NavSet::Admin,
            Some(_) => NavSet::User,
        }
    }
}

impl Default for MirrorState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

/// Store that mirrors the session cookie.
pub struct SessionMirror<C> {
    source: C,
    state: watch::Sender<MirrorState>,
}

impl<C: CookieSource> SessionMirror<C> {
    /// Create an unmounted mirror (`loading`, no user).
    #[must_use]
    pub fn new(source: C) -> Self {
        Self {
            source,
            state: watch::Sender::new(MirrorState::default()),
        }
    }

    /// Create and immediately mount.
    #[must_use]
    pub fn mounted(source: C) -> Self {
        let mirror = Self::new(source);
        mirror.mount();
        mirror
    }

    /// First read after construction.
    pub fn mount(&self) {
        self.refresh();
    }

    /// Re-read and decode the cookie.
    ///
    /// Call after any action that reissues the token, such as a profile
    /// update that changes the nickname.
    pub fn refresh(&self) {
        self.state.send_modify(|state| state.loading = true);

        let user = self
            .source
            .cookie(TOKEN_COOKIE)
            .and_then(|raw| token::decode(&raw));

        tracing::trace!(authenticated = user.is_some(), "session mirror refreshed");
        self.state.send_modify(|state| {
            state.user = user;
            state.loading = false;
        });
    }

    /// React to a browser lifecycle event.
    pub fn handle(&self, event: MirrorEvent) {
        match event {
            MirrorEvent::Focus | MirrorEvent::VisibilityChange => self.refresh(),
        }
    }

    /// Drop the user immediately, ahead of the logout navigation.
    pub fn clear(&self) {
        self.state.send_modify(|state| state.user = None);
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> MirrorState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MirrorState> {
        self.state.subscribe()
    }

    /// The cookie source backing this mirror.
    pub const fn source(&self) -> &C {
        &self.source
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    use super::*;
    use crate::types::UserId;

    fn token_for(payload: &serde_json::Value) -> String {
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
        format!("eyJhbGciOiJIUzI1NiJ9.{body}.sig")
    }

    /// Cookie jar the test can rewrite between refreshes, like another tab would.
    #[derive(Clone, Default)]
    struct SharedJar(Arc<Mutex<Option<String>>>);

    impl SharedJar {
        fn set(&self, value: Option<String>) {
            *self.0.lock().unwrap() = value;
        }
    }

    impl CookieSource for SharedJar {
        fn cookie(&self, name: &str) -> Option<String> {
            if name == TOKEN_COOKIE {
                self.0.lock().unwrap().clone()
            } else {
                None
            }
        }
    }

    #[test]
    fn test_cookie_header_parsing() {
        let header = CookieHeader::new("theme=dark; token=a.b.c; lang=es%2DAR");
        assert_eq!(header.cookie("token").as_deref(), Some("a.b.c"));
        assert_eq!(header.cookie("lang").as_deref(), Some("es-AR"));
        assert_eq!(header.cookie("missing"), None);
    }

    #[test]
    fn test_cookie_header_keeps_value_with_equals() {
        let header = CookieHeader::new("token=abc==");
        assert_eq!(header.cookie("token").as_deref(), Some("abc=="));
    }

    #[test]
    fn test_new_mirror_is_loading() {
        let mirror = SessionMirror::new(CookieHeader::default());
        let state = mirror.snapshot();
        assert!(state.loading);
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_mount_decodes_cookie() {
        let token = token_for(&json!({"usuario_id": 7, "apodo": "ana", "rol": "user", "iat": 123}));
        let mirror = SessionMirror::mounted(CookieHeader::new(format!("token={token}")));

        let state = mirror.snapshot();
        assert!(!state.loading);
        assert!(state.is_authenticated());
        let user = state.user.unwrap();
        assert_eq!(user.user_id, UserId::new(7));
        assert_eq!(user.nickname.as_deref(), Some("ana"));
    }

    #[test]
    fn test_mount_with_garbage_cookie_is_guest() {
        let mirror = SessionMirror::mounted(CookieHeader::new("token=garbage"));
        let state = mirror.snapshot();
        assert!(!state.loading);
        assert_eq!(state.nav(), NavSet::Guest);
    }

    #[test]
    fn test_focus_picks_up_out_of_band_change() {
        let jar = SharedJar::default();
        let mirror = SessionMirror::mounted(jar.clone());
        assert!(!mirror.snapshot().is_authenticated());

        jar.set(Some(token_for(&json!({"usuario_id": 2, "rol": "admin"}))));
        mirror.handle(MirrorEvent::Focus);
        assert!(mirror.snapshot().is_admin());

        jar.set(None);
        mirror.handle(MirrorEvent::VisibilityChange);
        assert!(!mirror.snapshot().is_authenticated());
    }

    #[test]
    fn test_refresh_after_token_reissue() {
        let jar = SharedJar::default();
        jar.set(Some(token_for(&json!({"usuario_id": 4, "apodo": "old", "rol": "user"}))));
        let mirror = SessionMirror::mounted(jar.clone());

        jar.set(Some(token_for(&json!({"usuario_id": 4, "apodo": "new", "rol": "user"}))));
        mirror.refresh();

        let state = mirror.snapshot();
        assert_eq!(state.user.unwrap().nickname.as_deref(), Some("new"));
    }

    #[test]
    fn test_clear_drops_user_immediately() {
        let token = token_for(&json!({"usuario_id": 1, "rol": "user"}));
        let mirror = SessionMirror::mounted(CookieHeader::new(format!("token={token}")));
        mirror.clear();
        assert!(!mirror.snapshot().is_authenticated());
    }

    #[test]
    fn test_nav_sets() {
        let user_token = token_for(&json!({"usuario_id": 1, "rol": "user"}));
        let other_token = token_for(&json!({"usuario_id": 1, "rol": "guest"}));
        let user = SessionMirror::mounted(CookieHeader::new(format!("token={user_token}")));
        let other = SessionMirror::mounted(CookieHeader::new(format!("token={other_token}")));
        assert_eq!(user.snapshot().nav(), NavSet::User);
        assert_eq!(other.snapshot().nav(), NavSet::User);
        assert!(!other.snapshot().is_admin());
    }

    #[test]
    fn test_closure_cookie_source() {
        let token = token_for(&json!({"usuario_id": 5, "rol": "admin"}));
        let mirror = SessionMirror::mounted(move |name: &str| {
            (name == TOKEN_COOKIE).then(|| token.clone())
        });
        assert_eq!(mirror.snapshot().nav(), NavSet::Admin);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let jar = SharedJar::default();
        let mirror = SessionMirror::new(jar.clone());
        let mut rx = mirror.subscribe();

        jar.set(Some(token_for(&json!({"usuario_id": 8, "rol": "user"}))));
        mirror.mount();

        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert!(!state.loading);
        assert!(state.is_authenticated());
    }
}
