//! The RFC 959 Change To Parent Directory (`CDUP`) command
//
// This command is a special case of CWD, and is included to
// simplify the implementation of programs for transferring
// directory trees between operating systems having different
// syntaxes for naming the parent directory.  The reply codes
// shall be identical to the reply codes of CWD.

use super::cwd::change_dir;
use crate::{
    auth::UserDetail,
    server::controlchan::{
        Reply,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::Driver,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Cdup;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Cdup
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        change_dir(args, Some("..")).await
    }
}
