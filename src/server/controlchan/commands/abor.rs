//! The RFC 959 Abort (`ABOR`) command
//
// This command tells the server to abort the previous FTP
// service command and any associated transfer of data. The
// abort command may require "special action", as discussed in
// the Section on FTP Commands, to force recognition by the
// server.  No action is to be taken if the previous command
// has been completed (including data transfer).  The control
// connection is not to be closed by the server, but the data
// connection must be closed.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::Driver,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Abor;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Abor
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        match args.session.abort_transfer().await {
            Some(outcome) => {
                slog::info!(args.logger, "Transfer aborted by client");
                Ok(Reply::Sequence(vec![
                    outcome.reply(),
                    Reply::new(ReplyCode::ClosingDataConnection, "ABOR command successful"),
                ]))
            }
            None => {
                // A negotiated but unused data connection is closed too.
                args.session.data = None;
                Ok(Reply::new(ReplyCode::DataConnectionOpen, "No transfer in progress"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::controlchan::{commands::Pasv, testing::Harness};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn without_a_transfer() {
        let mut h = Harness::new();
        let reply = h.run(Abor, "").await.unwrap();
        assert_eq!(reply.codes(), vec![ReplyCode::DataConnectionOpen]);
    }

    #[tokio::test]
    async fn closes_a_pending_passive_listener() {
        let mut h = Harness::new();
        let reply = h.run(Pasv, "").await.unwrap();
        assert_eq!(reply.codes(), vec![ReplyCode::EnteringPassiveMode]);
        assert_eq!(h.config.switchboard.in_use(), 1);

        h.run(Abor, "").await.unwrap();
        assert!(h.session.data.is_none());
        assert_eq!(h.config.switchboard.in_use(), 0);
    }
}
