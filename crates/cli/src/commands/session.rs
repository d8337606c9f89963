//! Token and mirror inspection.

use std::io::Write;

use myevent_core::{CookieHeader, SessionMirror, decode_payload};

use super::CommandError;

/// Print the decoded payload of a token, or "invalid token".
///
/// Shows the raw payload rather than the typed claims so fields the gateway
/// ignores are visible too.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn decode(out: &mut impl Write, token: &str) -> Result<(), CommandError> {
    match decode_payload(token) {
        Some(payload) => {
            serde_json::to_writer_pretty(&mut *out, &payload)?;
            writeln!(out)?;
            if myevent_core::decode(token).is_none() {
                writeln!(out, "(payload lacks usuario_id or rol; the gateway treats it as no token)")?;
            }
        }
        None => writeln!(out, "invalid token")?,
    }
    Ok(())
}

/// Run a mounted session mirror over a cookie header and print its snapshot.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn whoami(out: &mut impl Write, cookie: &str) -> Result<(), CommandError> {
    let mirror = SessionMirror::mounted(CookieHeader::new(cookie));
    let state = mirror.snapshot();

    writeln!(out, "authenticated: {}", state.is_authenticated())?;
    writeln!(out, "nav:           {}", state.nav().as_str())?;
    if let Some(user) = &state.user {
        writeln!(out, "user id:       {}", user.user_id)?;
        writeln!(out, "name:          {}", user.display_name())?;
        writeln!(out, "role:          {}", user.role)?;
        if let Some(issued_at) = user.issued_at_utc() {
            writeln!(out, "issued at:     {issued_at}")?;
        }
    }
    Ok(())
}
