//! The RFC 959 Rename To (`RNTO`) command
//
// This command specifies the new pathname of the file
// specified in the immediately preceding "rename from"
// command.  Together the two commands cause a file to be
// renamed.

use super::permission_denied;
use crate::{
    auth::{Operation, UserDetail},
    server::controlchan::{
        Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::Driver,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Rnto;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Rnto
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        let Some(from) = args.session.rename_from.take() else {
            return Ok(Reply::new(ReplyCode::BadCommandSequence, "Please tell me what file you want to rename first"));
        };
        if args.arg.is_empty() {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "No file name specified"));
        }
        let (driver, user) = args.login()?;
        let to = args.session.resolve(args.arg);
        if !args.config.authorizer.permit(&user, &to, Operation::Rename).await {
            return Ok(permission_denied());
        }
        driver.rename(&user, &from, &to).await?;
        slog::info!(args.logger, "Renamed"; "from" => %from.display(), "to" => %to.display());
        Ok(Reply::new(ReplyCode::FileActionOkay, "Renamed"))
    }
}
