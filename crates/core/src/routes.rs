//! Route table and path classification.
//!
//! The prefix lists below are the single source of truth for which pages are
//! login/registration pages, which belong to the user area and which belong to
//! the admin area. The gateway, the CLI and the session endpoint all read
//! [`ROUTE_TABLE`]; nothing else keeps a copy.
//!
//! Matching is segment-aware: prefix `/evento` matches `/evento` and
//! `/evento/12`, but not `/eventosPublicos`.

use serde::Serialize;
use thiserror::Error;

/// Where unauthenticated or revoked sessions are sent.
pub const LOGIN_PATH: &str = "/login";

/// Landing page for the user role.
pub const USER_HOME: &str = "/";

/// Landing page for the admin role.
pub const ADMIN_HOME: &str = "/eventosPublicos";

/// Access category of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// Login and registration pages.
    Auth,
    /// Pages that require the `user` role.
    User,
    /// Pages that require the `admin` role.
    Admin,
    /// Everything else.
    Public,
}

impl RouteClass {
    /// Whether the route requires a session at all.
    #[must_use]
    pub const fn is_protected(self) -> bool {
        matches!(self, Self::User | Self::Admin)
    }
}

impl std::fmt::Display for RouteClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "auth"),
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
            Self::Public => write!(f, "public"),
        }
    }
}

/// A prefix found in more than one list.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("route prefix {prefix} is listed as both {first} and {second}")]
pub struct OverlapError {
    pub prefix: &'static str,
    pub first: RouteClass,
    pub second: RouteClass,
}

/// Static prefix lists, one per protected category.
#[derive(Debug, Clone, Copy)]
pub struct RouteTable {
    /// Login and registration.
    pub auth: &'static [&'static str],
    /// Paths matched exactly (no sub-paths) for the user area.
    pub user_exact: &'static [&'static str],
    /// User-area prefixes.
    pub user: &'static [&'static str],
    /// Admin-area prefixes.
    pub admin: &'static [&'static str],
}

/// The application's route table.
pub const ROUTE_TABLE: RouteTable = RouteTable {
    auth: &["/login", "/register"],
    user_exact: &["/"],
    user: &[
        "/perfil",
        "/crearEvento",
        "/misEventos",
        "/eventosGuardados",
        "/misAsistencias",
        "/evento",
        "/buscarEventos",
        "/editarEvento",
    ],
    admin: &["/eventosPublicos", "/eventosPrivados", "/gestionUsuarios"],
};

/// Classify a path against [`ROUTE_TABLE`].
///
/// Expects a path already passed through [`normalize_path`].
#[must_use]
pub fn classify(path: &str) -> RouteClass {
    ROUTE_TABLE.classify(path)
}

/// Canonical form of a request path.
///
/// Collapses repeated `/`, resolves `.` and `..` segments (never above the
/// root) and decodes percent-encoded unreserved characters. Other escapes,
/// such as `%2F`, are kept as they are. A trailing `/` survives.
///
/// The gateway classifies and forwards this form, so the page server never
/// sees a path spelled differently from the one that was checked.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut trailing_slash = false;

    for raw in path.split('/') {
        let segment = decode_unreserved(raw);
        trailing_slash = matches!(segment.as_str(), "" | "." | "..");
        match segment.as_str() {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let mut normalized = format!("/{}", segments.join("/"));
    if trailing_slash && !segments.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Decode `%XX` escapes whose byte is an unreserved character
/// (`A-Z a-z 0-9 - . _ ~`).
fn decode_unreserved(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = String::with_capacity(segment.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes.get(i) == Some(&b'%') {
            let decoded = segment
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .filter(|byte| byte.is_ascii_alphanumeric() || b"-._~".contains(byte));
            if let Some(byte) = decoded {
                out.push(char::from(byte));
                i += 3;
                continue;
            }
        }
        // Copy up to the next escape candidate unchanged
        let next = segment
            .get(i + 1..)
            .and_then(|rest| rest.find('%'))
            .map_or(bytes.len(), |offset| i + 1 + offset);
        out.push_str(segment.get(i..next).unwrap_or_default());
        i = next;
    }
    out
}

impl RouteTable {
    /// Classify a request path. Query strings must already be stripped.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if matches_any(self.auth, path) {
            RouteClass::Auth
        } else if matches_any(self.admin, path) {
            RouteClass::Admin
        } else if self.user_exact.iter().any(|exact| *exact == path) || matches_any(self.user, path) {
            RouteClass::User
        } else {
            RouteClass::Public
        }
    }

    /// Check that no prefix (or exact path) falls under two categories.
    ///
    /// # Errors
    ///
    /// Returns the first overlap found.
    pub fn validate(&self) -> Result<(), OverlapError> {
        let lists = [
            (RouteClass::Auth, self.auth),
            (RouteClass::User, self.user_exact),
            (RouteClass::User, self.user),
            (RouteClass::Admin, self.admin),
        ];

        for (i, (class, prefixes)) in lists.iter().enumerate() {
            for prefix in *prefixes {
                for (other_class, others) in lists.iter().skip(i + 1) {
                    if other_class == class {
                        continue;
                    }
                    if others
                        .iter()
                        .any(|other| prefix_matches(other, prefix) || prefix_matches(prefix, other))
                    {
                        return Err(OverlapError {
                            prefix: *prefix,
                            first: *class,
                            second: *other_class,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Framework-style matcher patterns for every gated path.
    ///
    /// Exact paths are emitted as-is, prefixes as `prefix` and `prefix/:path*`.
    #[must_use]
    pub fn matcher_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self.user_exact.iter().map(ToString::to_string).collect();
        for prefix in self.auth.iter().chain(self.user).chain(self.admin) {
            patterns.push((*prefix).to_string());
            patterns.push(format!("{prefix}/:path*"));
        }
        patterns
    }

    /// All entries with their category, in table order.
    pub fn entries(&self) -> impl Iterator<Item = (RouteClass, &'static str)> + '_ {
        self.auth
            .iter()
            .map(|p| (RouteClass::Auth, *p))
            .chain(self.user_exact.iter().map(|p| (RouteClass::User, *p)))
            .chain(self.user.iter().map(|p| (RouteClass::User, *p)))
            .chain(self.admin.iter().map(|p| (RouteClass::Admin, *p)))
    }
}

fn matches_any(prefixes: &[&str], path: &str) -> bool {
    prefixes.iter().any(|prefix| prefix_matches(prefix, path))
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
