//! The RFC 3659 File Modification Time (`MDTM`) command
//
// The FTP command, MODIFICATION TIME (MDTM), can be used to determine
// when a file in the server NVFS was last modified. The time is given
// in UTC as YYYYMMDDHHMMSS.

use super::permission_denied;
use crate::{
    auth::{Operation, UserDetail},
    server::controlchan::{
        Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::{Driver, Metadata},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::SystemTime;

const RFC3659_TIME: &str = "%Y%m%d%H%M%S";

#[derive(Debug)]
pub struct Mdtm;

fn format_mdtm(modified: SystemTime) -> String {
    DateTime::<Utc>::from(modified).format(RFC3659_TIME).to_string()
}

#[async_trait]
impl<D, U> CommandHandler<D, U> for Mdtm
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        if args.arg.is_empty() {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "No file name specified"));
        }
        let (driver, user) = args.login()?;
        let path = args.session.resolve(args.arg);
        if !args.config.authorizer.permit(&user, &path, Operation::Read).await {
            return Ok(permission_denied());
        }
        let metadata = driver.stat(&user, &path).await?;
        if metadata.is_dir() {
            return Ok(Reply::new(ReplyCode::FileError, "Not a regular file"));
        }
        Ok(Reply::new_with_string(ReplyCode::FileStatus, format_mdtm(metadata.modified()?)))
    }
}
