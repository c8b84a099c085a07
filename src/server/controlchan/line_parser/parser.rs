use super::error::{ParseErrorKind, Result};
use crate::server::controlchan::command::Command;

use std::str;

/// Parse the given bytes into a [`Command`].
///
/// The verb is everything up to the first space (or the end of the line) and is uppercased. Exactly
/// one space separates it from the argument, so arguments may start with whitespace.
pub fn parse<T>(line: T) -> Result<Command>
where
    T: AsRef<[u8]>,
{
    let text = str::from_utf8(line.as_ref())?;
    let text = parse_to_eol(text)?;

    let (token, params) = match text.split_once(' ') {
        Some((token, params)) => (token, params),
        None => (text.as_str(), ""),
    };
    let verb = normalize(token)?;

    Ok(Command::new(verb, params))
}

// Strips the line terminator (CRLF or a bare LF) and any NUL characters. A CR anywhere else in
// the line is rejected.
fn parse_to_eol(text: &str) -> Result<String> {
    let end = text.find('\n').ok_or(ParseErrorKind::InvalidEol)?;
    let mut line: String = text[..end].chars().filter(|c| *c != '\0').collect();
    if line.ends_with('\r') {
        line.pop();
    }
    if line.contains('\r') {
        return Err(ParseErrorKind::InvalidEol.into());
    }
    Ok(line)
}

fn normalize(token: &str) -> Result<String> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ParseErrorKind::InvalidCommand.into());
    }
    Ok(token.to_ascii_uppercase())
}
