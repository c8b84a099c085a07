//! The RFC 959 Store (`STOR`) command
//
// This command causes the server-DTP to accept the data
// transferred via the data connection and to store the data as
// a file at the server site.  If the file specified in the
// pathname exists at the server site, then its contents shall
// be replaced by the data being transferred.  A new file is
// created at the server site if the file specified in the
// pathname does not already exist.

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
    storage::{Driver, WriteMode},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Stor;

/// Opens the upload target and starts receiving into it. Shared with `APPE`.
pub(super) async fn receive_file<D, U>(args: CommandContext<'_, D, U>, mode: WriteMode) -> Result<Reply, ControlChanError>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    if args.arg.is_empty() {
        return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "No file name specified"));
    }
    if args.session.data.is_none() {
        return Ok(no_data_connection());
    }
    let (driver, user) = args.login()?;
    let path = args.session.resolve(args.arg);
    if !args.config.authorizer.permit(&user, &path, Operation::Write).await {
        return Ok(permission_denied());
    }

    // APPE always writes at the end, whatever REST said.
    let offset = match mode {
        WriteMode::Truncate => std::mem::take(&mut args.session.start_pos),
        WriteMode::Append => {
            args.session.start_pos = 0;
            0
        }
    };
    let writer = driver.open_write(&user, &path, offset, mode).await?;

    let Some(conn) = args.session.data.take() else {
        return Ok(no_data_connection());
    };
    slog::info!(args.logger, "Receiving file"; "path" => %path.display(), "offset" => offset, "mode" => ?mode);
    Ok(start_transfer(args, conn, TransferJob::Upload(writer), "Ready to receive data"))
}

#[async_trait]
impl<D, U> CommandHandler<D, U> for Stor
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        receive_file(args, WriteMode::Truncate).await
    }
}
