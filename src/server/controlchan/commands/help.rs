//! The `HELP` command
//
// A HELP request asks for human-readable information from the server. The server may accept this request with code 211 or 214, or reject it with code 502.
//
// A HELP request may include a parameter. The meaning of the parameter is defined by the server. Some servers interpret the parameter as an FTP verb,
// and respond by briefly explaining the syntax of the verb.

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

const VERBS_PER_LINE: usize = 8;

#[derive(Debug)]
pub struct Help;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Help
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        let verbs = args.config.dispatch.verbs();
        let mut lines = vec![String::from("The following commands are recognized:")];
        lines.extend(verbs.chunks(VERBS_PER_LINE).map(|row| format!(" {}", row.join(" "))));
        lines.push(String::from("Help OK"));
        Ok(Reply::new_multiline(ReplyCode::HelpMessage, lines))
    }
}
