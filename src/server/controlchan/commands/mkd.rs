//! The RFC 959 Make Directory (`MKD`) command
//
// This command causes the directory specified in the pathname
// to be created as a directory (if the pathname is absolute)
// or as a subdirectory of the current working directory (if
// the pathname is relative).

use super::{permission_denied, pwd::quote_path};
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
pub struct Mkd;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Mkd
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
        if !args.config.authorizer.permit(&user, &path, Operation::Write).await {
            return Ok(permission_denied());
        }
        driver.mkdir(&user, &path).await?;
        slog::info!(args.logger, "Directory created"; "path" => %path.display());
        Ok(Reply::new_with_string(ReplyCode::DirCreated, format!("{} created", quote_path(&path))))
    }
}
