//! The RFC 2389 Feature (`FEAT`) command

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

// Each feature line must be indented by a space. Kept in alphabetical order.
const FEATURES: [&str; 6] = [" EPRT", " EPSV", " MDTM", " REST STREAM", " SIZE", " UTF8"];

#[derive(Debug)]
pub struct Feat;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Feat
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, _args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        let lines = std::iter::once("Extensions supported:").chain(FEATURES).chain(std::iter::once("END"));
        Ok(Reply::new_multiline(ReplyCode::SystemStatus, lines))
    }
}
