//! The RFC 959 Rename From (`RNFR`) command
//
// This command specifies the old pathname of the file which is
// to be renamed.  This command must be immediately followed by
// a "rename to" command specifying the new file pathname.

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
pub struct Rnfr;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Rnfr
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
        if !args.config.authorizer.permit(&user, &path, Operation::Rename).await {
            return Ok(permission_denied());
        }
        // Fails with 550 when there is nothing to rename.
        driver.stat(&user, &path).await?;
        args.session.rename_from = Some(path);
        Ok(Reply::new(ReplyCode::FileActionPending, "Tell me, what would you like the new name to be?"))
    }
}
