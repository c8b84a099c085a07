//! The RFC 3659 File Size (`SIZE`) command
//
// The FTP command, SIZE OF FILE (SIZE), is used to obtain the transfer
// size of a file from the server-FTP process.  This is the exact number
// of octets (8 bit bytes) that would be transmitted over the data
// connection should that file be transmitted.

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
pub struct Size;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Size
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
        if !args.config.authorizer.permit(&user, &path, Operation::Read).await {
            return Ok(permission_denied());
        }
        let metadata = driver.stat(&user, &path).await?;
        if metadata.is_dir() {
            return Ok(Reply::new(ReplyCode::FileError, "Not a regular file"));
        }
        Ok(Reply::new_with_string(ReplyCode::FileStatus, metadata.len().to_string()))
    }
}
