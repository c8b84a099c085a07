//! The RFC 959 Delete (`DELE`) command
//
// This command causes the file specified in the pathname to be
// deleted at the server site.  If an extra level of protection
// is desired (such as the query, "Do you really wish to delete?"),
// it should be provided by the user-FTP process.

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
pub struct Dele;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Dele
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        if args.arg.is_empty() {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "No file name specified"));
        }
        let (driver, user) = args.login()?;
        let path = args.session.resolve(args.arg);
        if !args.config.authorizer.permit(&user, &path, Operation::Delete).await {
            return Ok(permission_denied());
        }
        if driver.stat(&user, &path).await?.is_dir() {
            return Ok(Reply::new(ReplyCode::FileError, "Is a directory, use RMD"));
        }
        driver.remove(&user, &path).await?;
        slog::info!(args.logger, "File deleted"; "path" => %path.display());
        Ok(Reply::new(ReplyCode::FileActionOkay, "File successfully removed"))
    }
}
