//! The RFC 2389 Options (`OPTS`) command
//
// The OPTS (options) command allows a user-PI to specify the desired
// behavior of a server-FTP process when another FTP command (the target
// command) is later issued.  The exact behavior, and syntax, will vary
// with the target command indicated, and will be specified with the
// definition of that command.  Where no OPTS behavior is defined for a
// particular command there are no options available for that command.

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
pub struct Opts;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Opts
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        let mut words = args.arg.split_ascii_whitespace();
        let option = words.next().map(str::to_ascii_uppercase);
        let value = words.next().map(str::to_ascii_uppercase);
        match (option.as_deref(), value.as_deref()) {
            (Some("UTF8"), Some("ON")) | (Some("UTF-8"), Some("ON")) => Ok(Reply::new(ReplyCode::CommandOkay, "Always in UTF-8 mode.")),
            (Some("UTF8"), Some("OFF")) | (Some("UTF-8"), Some("OFF")) => {
                Ok(Reply::new(ReplyCode::CommandNotImplementedForParameter, "Non UTF-8 mode not supported"))
            }
            _ => Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Unknown option")),
        }
    }
}
