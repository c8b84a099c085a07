//! The RFC 959 Append (`APPE`) command
//
// This command causes the server-DTP to accept the data
// transferred via the data connection and to store the data in
// a file at the server site.  If the file specified in the
// pathname exists at the server site, the data shall be
// appended to that file; otherwise the file shall be created.

use super::stor::receive_file;
use crate::{
    auth::UserDetail,
    server::controlchan::{
        Reply,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::{Driver, WriteMode},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Appe;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Appe
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        receive_file(args, WriteMode::Append).await
    }
}
