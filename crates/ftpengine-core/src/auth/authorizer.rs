//! The service provider interface (SPI) for per-path permission checks

use super::UserDetail;
use async_trait::async_trait;
use derive_more::Display;
use std::{fmt::Debug, path::Path};

/// The kinds of file system operations the server asks an [`Authorizer`] about.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Reading file contents or file metadata (`RETR`, `SIZE`, `MDTM`).
    #[display("read")]
    Read,
    /// Creating or overwriting files and creating directories (`STOR`, `APPE`, `MKD`).
    #[display("write")]
    Write,
    /// Listing a directory or entering it (`LIST`, `NLST`, `CWD`).
    #[display("list")]
    List,
    /// Removing files or directories (`DELE`, `RMD`).
    #[display("delete")]
    Delete,
    /// Renaming files or directories (`RNFR`, `RNTO`).
    #[display("rename")]
    Rename,
}

/// Decides whether an authenticated user may perform an [`Operation`] on a path.
///
/// The path handed to `permit` is the absolute path as seen by the FTP client, after resolving it
/// against the session's working directory.
#[async_trait]
pub trait Authorizer<User>: Sync + Send + Debug
where
    User: UserDetail,
{
    /// Returns true if `user` may perform `op` on `path`.
    async fn permit(&self, user: &User, path: &Path, op: Operation) -> bool;
}

/// An [`Authorizer`] that permits everything to everyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl<User: UserDetail> Authorizer<User> for AllowAll {
    async fn permit(&self, _user: &User, _path: &Path, _op: Operation) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DefaultUser;
    use pretty_assertions::assert_eq;

    #[tokio::test(flavor = "current_thread")]
    async fn allow_all_permits_every_operation() {
        for op in [Operation::Read, Operation::Write, Operation::List, Operation::Delete, Operation::Rename] {
            assert!(AllowAll.permit(&DefaultUser, Path::new("/any/where"), op).await);
        }
    }

    #[test]
    fn operation_display() {
        assert_eq!(Operation::Rename.to_string(), "rename");
    }
}
