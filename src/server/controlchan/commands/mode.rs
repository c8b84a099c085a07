//! The RFC 959 Transfer Mode (`MODE`) command
//
// The argument is a single Telnet character code specifying
// the data transfer modes described in the Section on
// Transmission Modes.
//
// The following codes are assigned for transfer modes:
//
// S - Stream
// B - Block
// C - Compressed
//
// The default transfer mode is Stream.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::Driver,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Mode;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Mode
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        if args.arg.eq_ignore_ascii_case("S") {
            Ok(Reply::new(ReplyCode::CommandOkay, "Using Stream transfer mode"))
        } else {
            Ok(Reply::new(ReplyCode::CommandNotImplementedForParameter, "Only Stream transfer mode is supported"))
        }
    }
}
