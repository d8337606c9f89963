//! Session and route authorization gate.
//!
//! Runs on every request before it reaches a page. Reads the `token` cookie,
//! classifies the path, optionally confirms the session with the backend, and
//! then either lets the request through or redirects it.
//!
//! The only side effects are the redirect itself and, when the backend says
//! the session is no longer valid, removal of the `token` cookie.

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode, Uri, uri::PathAndQuery},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::Span;

use myevent_core::{
    GateDecision, RouteClass, SessionClaims, SessionState, SessionToken, TOKEN_COOKIE, classify,
    evaluate, normalize_path,
};

use super::session::CurrentSession;
use crate::config::FailurePolicy;
use crate::error::{add_breadcrumb, set_sentry_user};
use crate::services::StatusOutcome;
use crate::state::AppState;

/// Gate middleware, installed with `axum::middleware::from_fn_with_state`.
pub async fn session_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Err(response) = canonicalize(&mut request) {
        return response;
    }
    let class = classify(request.uri().path());
    Span::current().record("route_class", tracing::field::display(class));

    let token = jar
        .get(TOKEN_COOKIE)
        .map(|cookie| SessionToken::new(cookie.value()));
    let claims = token.as_ref().and_then(SessionToken::claims);

    let revoked = match (&token, &claims) {
        (Some(token), Some(_)) => is_revoked(&state, token, class).await,
        _ => false,
    };

    let session = if revoked {
        SessionState::Revoked
    } else {
        SessionState::from_claims(claims.as_ref())
    };
    let decision = evaluate(session, class);

    if decision.is_allow() {
        if let Some(claims) = claims {
            attach_session(&mut request, claims);
        }
        return next.run(request).await;
    }

    reject(jar, decision, request.method(), request.uri().path(), class)
}

/// Replace the request path with its normalized form.
///
/// Classification and forwarding both read the rewritten URI, so a path
/// like `//gestionUsuarios` is checked as the page it resolves to.
fn canonicalize(request: &mut Request) -> Result<(), Response> {
    let raw = request.uri().path();
    let path = normalize_path(raw);
    if path == raw {
        return Ok(());
    }

    let path_and_query = match request.uri().query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };
    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = Some(
        PathAndQuery::try_from(path_and_query).map_err(|_| StatusCode::BAD_REQUEST.into_response())?,
    );
    let uri = Uri::from_parts(parts).map_err(|_| StatusCode::BAD_REQUEST.into_response())?;

    tracing::debug!(raw = %request.uri().path(), normalized = %uri.path(), "request path normalized");
    *request.uri_mut() = uri;
    Ok(())
}

/// Ask the backend about the session, applying the failure policy.
///
/// Public routes never trigger the call.
async fn is_revoked(state: &AppState, token: &SessionToken, class: RouteClass) -> bool {
    let settings = state.config().status_check;
    if !settings.enabled || class == RouteClass::Public {
        return false;
    }

    match state.status().outcome(token).await {
        StatusOutcome::Active => false,
        StatusOutcome::Inactive => {
            tracing::info!("backend revoked session");
            true
        }
        StatusOutcome::Unreachable => match settings.policy {
            FailurePolicy::FailOpen => {
                tracing::warn!("status check unavailable, routing on decoded role");
                false
            }
            FailurePolicy::FailClosed => {
                tracing::warn!("status check unavailable, treating session as revoked");
                true
            }
        },
    }
}

fn attach_session(request: &mut Request, claims: SessionClaims) {
    let span = Span::current();
    span.record("user_id", tracing::field::display(claims.user_id));
    span.record("role", tracing::field::display(&claims.role));
    set_sentry_user(&claims.user_id, claims.nickname.as_deref());

    request.extensions_mut().insert(CurrentSession(claims));
}

/// Build the response for a non-allow decision.
///
/// Page navigations (`GET`/`HEAD`) are redirected. Anything else gets a bare
/// status so form posts and scripted calls are not replayed against the
/// login page.
fn reject(
    jar: CookieJar,
    decision: GateDecision,
    method: &Method,
    path: &str,
    class: RouteClass,
) -> Response {
    let location = decision.location().unwrap_or(myevent_core::LOGIN_PATH);
    tracing::info!(%path, %class, ?decision, "navigation redirected");
    add_breadcrumb(
        "gate",
        "navigation redirected",
        Some(&[("from", path), ("to", location)]),
    );

    let jar = if decision.clears_cookie() {
        jar.remove(Cookie::build(TOKEN_COOKIE).path("/"))
    } else {
        jar
    };

    if is_navigation(method) {
        (jar, Redirect::temporary(location)).into_response()
    } else if decision.is_unauthenticated() {
        (jar, StatusCode::UNAUTHORIZED).into_response()
    } else {
        (jar, StatusCode::FORBIDDEN).into_response()
    }
}

fn is_navigation(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_navigation() {
        assert!(is_navigation(&Method::GET));
        assert!(is_navigation(&Method::HEAD));
        assert!(!is_navigation(&Method::POST));
        assert!(!is_navigation(&Method::DELETE));
    }

    #[test]
    fn test_canonicalize_rewrites_path_keeps_query() {
        let mut request = axum::http::Request::builder()
            .uri("//misEventos/./3?page=2")
            .body(axum::body::Body::empty())
            .unwrap();
        assert!(canonicalize(&mut request).is_ok());
        assert_eq!(request.uri().path(), "/misEventos/3");
        assert_eq!(request.uri().query(), Some("page=2"));
    }

    #[test]
    fn test_canonicalize_leaves_canonical_path() {
        let mut request = axum::http::Request::builder()
            .uri("http://gateway.local/gestionUsuarios?x=1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert!(canonicalize(&mut request).is_ok());
        assert_eq!(request.uri().to_string(), "http://gateway.local/gestionUsuarios?x=1");
    }

    #[test]
    fn test_reject_redirects_navigation() {
        let response = reject(
            CookieJar::new(),
            GateDecision::RedirectHome,
            &Method::GET,
            "/gestionUsuarios",
            RouteClass::Admin,
        );
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()["location"], "/");
    }

    #[test]
    fn test_reject_non_navigation_statuses() {
        let unauthenticated = reject(
            CookieJar::new(),
            GateDecision::RedirectLogin {
                clear_cookie: false,
            },
            &Method::POST,
            "/crearEvento",
            RouteClass::User,
        );
        assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

        let mismatch = reject(
            CookieJar::new(),
            GateDecision::RedirectAdminHome,
            &Method::POST,
            "/crearEvento",
            RouteClass::User,
        );
        assert_eq!(mismatch.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_reject_clears_cookie_on_revocation() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("cookie", "token=a.b.c".parse().unwrap());
        let jar = CookieJar::from_headers(&headers);

        let response = reject(
            jar,
            GateDecision::RedirectLogin { clear_cookie: true },
            &Method::GET,
            "/misEventos",
            RouteClass::User,
        );
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let set_cookie = response.headers()["set-cookie"].to_str().unwrap();
        assert!(set_cookie.starts_with("token="));
        assert!(set_cookie.contains("Max-Age=0") || set_cookie.contains("Expires="));
    }
}
