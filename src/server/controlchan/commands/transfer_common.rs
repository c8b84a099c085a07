//! Contains the data connection plumbing shared by the data port and the transfer commands.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{Reply, ReplyCode, handler::CommandContext},
        datachan::{self, DataConnection, TransferJob, TransferOutcome},
        session::Session,
    },
    storage::Driver,
};

/// Gets rid of the session's current data connection before a new one is negotiated: a running
/// transfer is aborted and a pending listener closed.
pub(super) async fn reset_data_connection<D, U>(session: &mut Session<D, U>) -> Option<TransferOutcome>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    session.data = None;
    session.abort_transfer().await
}

/// Prefixes `reply` with the reply of a transfer that had to make way.
pub(super) fn after_reset(aborted: Option<TransferOutcome>, reply: Reply) -> Reply {
    match aborted {
        Some(outcome) => Reply::Sequence(vec![outcome.reply(), reply]),
        None => reply,
    }
}

pub(super) fn no_data_connection() -> Reply {
    Reply::new(ReplyCode::CantOpenDataConnection, "Use PORT or PASV first")
}

/// Hands the pending data connection and `job` to a new transfer task and tells the client the
/// transfer is about to start.
pub(super) fn start_transfer<D, U>(args: CommandContext<'_, D, U>, conn: DataConnection, job: TransferJob, msg: &str) -> Reply
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    let transfer = datachan::spawn_transfer(
        conn,
        job,
        args.session.transfer_type,
        args.config.data_connect_timeout,
        args.logger.clone(),
    );
    args.session.transfer = Some(transfer);
    Reply::new(ReplyCode::FileStatusOkay, msg)
}
