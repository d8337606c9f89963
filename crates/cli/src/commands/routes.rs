//! Route table commands.

use std::io::Write;

use myevent_core::{
    ADMIN_HOME, LOGIN_PATH, ROUTE_TABLE, USER_HOME, classify as classify_path, normalize_path,
};

use super::CommandError;

/// Print the class of one path, after the same normalization the gateway
/// applies.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn classify(out: &mut impl Write, path: &str) -> Result<(), CommandError> {
    // Accept pasted URLs with a query string
    let path = normalize_path(path.split_once('?').map_or(path, |(path, _)| path));
    writeln!(out, "{path}: {}", classify_path(&path))?;
    Ok(())
}

/// Print every table entry, the landing pages and the matcher patterns.
///
/// # Errors
///
/// Returns an error if the table has overlapping entries or the output
/// cannot be written.
pub fn list(out: &mut impl Write) -> Result<(), CommandError> {
    ROUTE_TABLE.validate()?;

    for (class, prefix) in ROUTE_TABLE.entries() {
        writeln!(out, "{:<6} {prefix}", class.to_string())?;
    }

    writeln!(out)?;
    writeln!(out, "login       {LOGIN_PATH}")?;
    writeln!(out, "user home   {USER_HOME}")?;
    writeln!(out, "admin home  {ADMIN_HOME}")?;

    writeln!(out)?;
    writeln!(out, "matcher:")?;
    for pattern in ROUTE_TABLE.matcher_patterns() {
        writeln!(out, "  {pattern}")?;
    }
    Ok(())
}
