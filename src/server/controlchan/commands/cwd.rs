//! The RFC 959 Change Working Directory (`CWD`) command
//
// This command allows the user to work with a different
// directory or dataset for file storage or retrieval without
// altering his login or accounting information.  Transfer
// parameters are similarly unchanged.  The argument is a
// pathname specifying a directory or other system dependent
// file group designator.

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

#[derive(Debug)]
pub struct Cwd;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Cwd
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        if args.arg.is_empty() {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "No directory specified"));
        }
        change_dir(args, None).await
    }
}

/// Moves the working directory to `target`, or to the argument resolved against it. Shared with
/// `CDUP`.
pub(super) async fn change_dir<D, U>(args: CommandContext<'_, D, U>, target: Option<&str>) -> Result<Reply, ControlChanError>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    let (driver, user) = args.login()?;
    let path = args.session.resolve(target.unwrap_or(args.arg));
    if !args.config.authorizer.permit(&user, &path, Operation::List).await {
        return Ok(permission_denied());
    }
    let metadata = driver.stat(&user, &path).await?;
    if !metadata.is_dir() {
        return Ok(Reply::new(ReplyCode::FileError, "Not a directory"));
    }
    slog::debug!(args.logger, "Changed working directory"; "cwd" => %path.display());
    args.session.cwd = path;
    Ok(Reply::new(ReplyCode::FileActionOkay, "Okay."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::controlchan::{error::ControlChanErrorKind, testing::Harness};
    use crate::storage::ErrorKind;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[tokio::test]
    async fn changes_into_an_existing_directory() {
        let mut h = Harness::new();
        std::fs::create_dir(h.root().join("docs")).unwrap();
        let reply = h.run(Cwd, "docs").await.unwrap();
        assert_eq!(reply.codes(), vec![ReplyCode::FileActionOkay]);
        assert_eq!(h.session.cwd, PathBuf::from("/docs"));
    }

    #[tokio::test]
    async fn missing_directory_is_a_storage_error() {
        let mut h = Harness::new();
        let err = h.run(Cwd, "nope").await.unwrap_err();
        assert_eq!(err.kind(), ControlChanErrorKind::StorageError(ErrorKind::NotFound));
        assert_eq!(h.session.cwd, PathBuf::from("/"));
    }

    #[tokio::test]
    async fn refuses_files() {
        let mut h = Harness::new();
        std::fs::write(h.root().join("a.txt"), b"x").unwrap();
        let reply = h.run(Cwd, "a.txt").await.unwrap();
        assert_eq!(reply.codes(), vec![ReplyCode::FileError]);
    }
}
