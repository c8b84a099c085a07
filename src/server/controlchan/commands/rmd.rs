//! The RFC 959 Remove Directory (`RMD`) command
//
// This command causes the directory specified in the pathname
// to be removed as a directory (if the pathname is absolute)
// or as a subdirectory of the current working directory (if
// the pathname is relative).

use super::permission_denied;
use crate::{
    auth::{Operation, UserDetail},
    server::controlchan::{
        Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::{Driver, Metadata},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Rmd;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Rmd
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        if args.arg.is_empty() {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "No directory specified"));
        }
        let (driver, user) = args.login()?;
        let path = args.session.resolve(args.arg);
        if !args.config.authorizer.permit(&user, &path, Operation::Delete).await {
            return Ok(permission_denied());
        }
        if !driver.stat(&user, &path).await?.is_dir() {
            return Ok(Reply::new(ReplyCode::FileError, "Not a directory"));
        }
        driver.remove(&user, &path).await?;
        slog::info!(args.logger, "Directory removed"; "path" => %path.display());
        Ok(Reply::new(ReplyCode::FileActionOkay, "Folder successfully removed"))
    }
}
