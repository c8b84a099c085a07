//! The RFC 959 Print Working Directory (`PWD`) command
//
// This command causes the name of the current working
// directory to be returned in the reply.

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
use std::path::Path;

#[derive(Debug)]
pub struct Pwd;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Pwd
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        Ok(Reply::new_with_string(
            ReplyCode::DirCreated,
            format!("{} is the current directory", quote_path(&args.session.cwd)),
        ))
    }
}

/// Puts a path between double quotes the way RFC 959 prescribes for 257 replies: quotes inside
/// the name are doubled.
pub(crate) fn quote_path(path: &Path) -> String {
    format!("\"{}\"", path.to_string_lossy().replace('"', "\"\""))
}
