//! The RFC 959 Representation Type (`TYPE`) command
//
// The argument specifies the representation type as described
// in the Section on Data Representation and Storage.  Several
// types take a second parameter.  The first parameter is
// denoted by a single Telnet character, as is the second
// Format parameter for ASCII and EBCDIC; the second parameter
// for local byte is a decimal integer to indicate Bytesize.
// The parameters are separated by a <SP> (Space, ASCII code
// 32).
//
// The following codes are assigned for type:
//
//           \    /
// A - ASCII |    | N - Non-print
//           |-><-| T - Telnet format effectors
// E - EBCDIC|    | C - Carriage Control (ASA)
//           /    \
// I - Image
//
// L <byte size> - Local byte Byte size
//
//
// The default representation type is ASCII Non-print.  If the
// Format parameter is changed, and later just the first
// argument is changed, Format then returns to the Non-print
// default.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        session::TransferType,
    },
    storage::Driver,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Type;

/// Parses the argument of `TYPE`. Only the types that make sense on a byte oriented host are
/// accepted: ASCII with the Non-print format, Image, and Local with a byte size of 8.
fn parse_type(arg: &str) -> Option<TransferType> {
    let mut params = arg.split_ascii_whitespace().map(|p| p.to_ascii_uppercase());
    let kind = params.next()?;
    let format = params.next();
    if params.next().is_some() {
        return None;
    }
    match (kind.as_str(), format.as_deref()) {
        ("A", None) | ("A", Some("N")) => Some(TransferType::Ascii),
        ("I", None) | ("L", Some("8")) => Some(TransferType::Binary),
        _ => None,
    }
}

#[async_trait]
impl<D, U> CommandHandler<D, U> for Type
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        match parse_type(args.arg) {
            Some(TransferType::Ascii) => {
                args.session.transfer_type = TransferType::Ascii;
                Ok(Reply::new(ReplyCode::CommandOkay, "Switching to ASCII mode"))
            }
            Some(TransferType::Binary) => {
                args.session.transfer_type = TransferType::Binary;
                Ok(Reply::new(ReplyCode::CommandOkay, "Switching to binary mode"))
            }
            None => Ok(Reply::new(ReplyCode::CommandNotImplementedForParameter, "Unsupported representation type")),
        }
    }
}
