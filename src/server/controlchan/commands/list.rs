//! The `LIST` command
//
// This command causes a list to be sent from the server to the
// passive DTP.  If the pathname specifies a directory or other
// group of files, the server should transfer a list of files
// in the specified directory.  If the pathname specifies a
// file then the server should send current information on the
// file.  A null argument implies the user's current working or
// default directory.  The data transfer is over the data
// connection in type ASCII or type EBCDIC.  (The user must
// ensure that the TYPE is appropriately ASCII or EBCDIC).
// Since the information on a file may vary widely from system
// to system, this information may be hard to use automatically
// in a program, but may be quite useful to a human user.

use super::{
    permission_denied,
    transfer_common::{no_data_connection, start_transfer},
};
use crate::{
    auth::{Operation, UserDetail},
    server::{
        controlchan::{
            Reply,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        datachan::TransferJob,
    },
    storage::Driver,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct List;

/// The listing flavours that travel over the data connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ListFormat {
    Long,
    NamesOnly,
}

/// Drops the `ls` style options (`-la` and friends) many clients send, leaving the path.
pub(super) fn strip_options(arg: &str) -> &str {
    let mut rest = arg.trim_start();
    while rest.starts_with('-') {
        rest = rest.split_once(' ').map(|(_, path)| path.trim_start()).unwrap_or("");
    }
    rest
}

/// Formats the listing of the argument path and sends it. Shared with `NLST`.
pub(super) async fn send_listing<D, U>(args: CommandContext<'_, D, U>, format: ListFormat) -> Result<Reply, ControlChanError>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    if args.session.data.is_none() {
        return Ok(no_data_connection());
    }
    let (driver, user) = args.login()?;
    let path = args.session.resolve(strip_options(args.arg));
    if !args.config.authorizer.permit(&user, &path, Operation::List).await {
        return Ok(permission_denied());
    }
    let listing = match format {
        ListFormat::Long => driver.list_fmt(&user, &path).await?,
        ListFormat::NamesOnly => driver.nlst_fmt(&user, &path).await?,
    };

    let Some(conn) = args.session.data.take() else {
        return Ok(no_data_connection());
    };
    slog::debug!(args.logger, "Sending directory listing"; "path" => %path.display(), "format" => ?format);
    Ok(start_transfer(args, conn, TransferJob::Listing(listing), "Sending directory list"))
}

#[async_trait]
impl<D, U> CommandHandler<D, U> for List
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        send_listing(args, ListFormat::Long).await
    }
}
