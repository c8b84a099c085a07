//! The fallback for every verb the server does not know.

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
pub struct Unsupported;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Unsupported
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, _args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        Ok(Reply::new(ReplyCode::CommandSyntaxError, "Command not implemented"))
    }
}
