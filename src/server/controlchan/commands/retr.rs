//! The RFC 959 Retrieve (`RETR`) command
//
// This command causes the server-DTP to transfer a copy of the
// file, specified in the pathname, to the server- or user-DTP
// at the other end of the data connection.  The status and
// contents of the file at the server site shall be unaffected.

use super::{
    permission_denied,
    transfer_common::{no_data_connection, start_transfer},
};
use crate::{
    auth::{Operation, UserDetail},
    server::{
        controlchan::{
            Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        datachan::TransferJob,
    },
    storage::{Driver, Metadata},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Retr;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Retr
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        if args.arg.is_empty() {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "No file name specified"));
        }
        if args.session.data.is_none() {
            return Ok(no_data_connection());
        }
        let (driver, user) = args.login()?;
        let path = args.session.resolve(args.arg);
        if !args.config.authorizer.permit(&user, &path, Operation::Read).await {
            return Ok(permission_denied());
        }

        let offset = std::mem::take(&mut args.session.start_pos);
        if offset > 0 {
            let metadata = driver.stat(&user, &path).await?;
            if offset > metadata.len() {
                return Ok(Reply::new(ReplyCode::InvalidRestartOffset, "Restart offset beyond end of file"));
            }
        }
        let reader = driver.open_read(&user, &path, offset).await?;

        let Some(conn) = args.session.data.take() else {
            return Ok(no_data_connection());
        };
        slog::info!(args.logger, "Sending file"; "path" => %path.display(), "offset" => offset);
        Ok(start_transfer(args, conn, TransferJob::Download(reader), "Sending data"))
    }
}
