use super::error::{ParseError, ParseErrorKind};
use crate::server::controlchan::{command::Command, line_parser::parser::parse};

use pretty_assertions::assert_eq;

#[test]
fn parse_user_cmd_crnl() {
    let input = "USER Dolores\r\n";
    assert_eq!(parse(input).unwrap(), Command::new("USER", "Dolores"));
}

#[test]
fn parse_user_cmd_mixed_case() {
    let input = "uSeR Dolores\r\n";
    assert_eq!(parse(input).unwrap(), Command::new("USER", "Dolores"));
}

#[test]
fn parse_user_lowercase() {
    let input = "user Dolores\r\n";
    assert_eq!(parse(input).unwrap(), Command::new("USER", "Dolores"));
}

#[test]
// Not all clients include the (actually mandatory) '\r'
fn parse_user_cmd_nl() {
    let input = "USER Dolores\n";
    assert_eq!(parse(input).unwrap(), Command::new("USER", "Dolores"));
}

#[test]
// Although we accept requests ending in only '\n', we won't accept requests ending only in '\r'
fn parse_user_cmd_cr() {
    let input = "USER Dolores\r";
    assert_eq!(parse(input), Err(ParseError::from(ParseErrorKind::InvalidEol)));
}

#[test]
// We should fail if the request does not end in '\n' or '\r'
fn parse_user_cmd_no_eol() {
    let input = "USER Dolores";
    assert_eq!(parse(input), Err(ParseError::from(ParseErrorKind::InvalidEol)));
}

#[test]
fn parse_bare_cr_inside_line() {
    let input = "USER Dol\rores\r\n";
    assert_eq!(parse(input), Err(ParseError::from(ParseErrorKind::InvalidEol)));
}

#[test]
// We should skip only one space after a token, to allow for tokens starting with a space.
fn parse_user_cmd_double_space() {
    let input = "USER  Dolores\r\n";
    assert_eq!(parse(input).unwrap(), Command::new("USER", " Dolores"));
}

#[test]
fn parse_user_cmd_whitespace() {
    let input = "USER Dolores Abernathy\r\n";
    assert_eq!(parse(input).unwrap(), Command::new("USER", "Dolores Abernathy"));
}

#[test]
fn parse_pass_cmd_whitespace() {
    let input = "PASS s3cr#t p@S$w0rd\r\n";
    assert_eq!(parse(input).unwrap(), Command::new("PASS", "s3cr#t p@S$w0rd"));
}

#[test]
fn parse_verb_without_argument() {
    assert_eq!(parse("PWD\r\n").unwrap(), Command::new("PWD", ""));
    assert_eq!(parse("pasv\n").unwrap(), Command::new("PASV", ""));
}

#[test]
fn parse_unknown_verb_is_not_a_parse_error() {
    assert_eq!(parse("XYZZY plugh\r\n").unwrap(), Command::new("XYZZY", "plugh"));
}

#[test]
fn parse_strips_nul_characters() {
    assert_eq!(parse("RETR a\0b.txt\r\n").unwrap(), Command::new("RETR", "ab.txt"));
}

#[test]
fn parse_empty_line() {
    assert_eq!(parse("\r\n"), Err(ParseError::from(ParseErrorKind::InvalidCommand)));
}

#[test]
fn parse_verb_with_garbage() {
    assert_eq!(parse("US\x01R x\r\n"), Err(ParseError::from(ParseErrorKind::InvalidCommand)));
}

#[test]
fn parse_invalid_utf8() {
    let input: &[u8] = b"USER \xc3\x28\r\n";
    assert_eq!(parse(input), Err(ParseError::from(ParseErrorKind::InvalidUtf8)));
}

#[test]
fn parse_list_with_options() {
    assert_eq!(parse("LIST -la /tmp\r\n").unwrap(), Command::new("LIST", "-la /tmp"));
}
