//! Defines the service provider interface for storage driver implementors.

use super::error::Error;
use crate::auth::UserDetail;
use async_trait::async_trait;
use chrono::prelude::{DateTime, Utc};
use std::{
    fmt::{self, Debug, Formatter, Write},
    io,
    path::{Path, PathBuf},
    result,
    time::{Duration, SystemTime},
};

/// Result type used by traits in this module
pub type Result<T> = result::Result<T, Error>;

/// A readable byte stream handed out by [`Driver::open_read`].
pub type ReadStream = Box<dyn tokio::io::AsyncRead + Send + Sync + Unpin>;

/// A writable byte sink handed out by [`Driver::open_write`].
pub type WriteStream = Box<dyn tokio::io::AsyncWrite + Send + Sync + Unpin>;

/// Represents the metadata of a _FTP File_
pub trait Metadata {
    /// Returns the length (size) of the file in bytes.
    fn len(&self) -> u64;

    /// Returns `self.len() == 0`.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the path is a directory.
    fn is_dir(&self) -> bool;

    /// Returns true if the path is a file.
    fn is_file(&self) -> bool;

    /// Returns true if the path is a symbolic link.
    fn is_symlink(&self) -> bool;

    /// Returns the last modified time of the path.
    fn modified(&self) -> Result<SystemTime>;

    /// Returns the `gid` of the file.
    fn gid(&self) -> u32;

    /// Returns the `uid` of the file.
    fn uid(&self) -> u32;

    /// Returns the number of links to the file. The default implementation always returns `1`
    fn links(&self) -> u64 {
        1
    }

    /// Returns the `permissions` of the file. The default implementation assumes unix permissions
    /// and defaults to "rwxr-xr-x" (octal 0755)
    fn permissions(&self) -> Permissions {
        Permissions(0o755)
    }

    /// If this is a symlink, return the path to its target
    fn readlink(&self) -> Option<&Path> {
        None
    }
}

/// Represents the permissions of a _FTP File_
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions(pub u32);

const PERM_READ: u32 = 0b100100100;
const PERM_WRITE: u32 = 0b010010010;
const PERM_EXEC: u32 = 0b001001001;
const PERM_USER: u32 = 0b111000000;
const PERM_GROUP: u32 = 0b000111000;
const PERM_OTHERS: u32 = 0b000000111;

impl std::fmt::Display for Permissions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for class in [PERM_USER, PERM_GROUP, PERM_OTHERS] {
            f.write_char(if self.0 & class & PERM_READ > 0 { 'r' } else { '-' })?;
            f.write_char(if self.0 & class & PERM_WRITE > 0 { 'w' } else { '-' })?;
            f.write_char(if self.0 & class & PERM_EXEC > 0 { 'x' } else { '-' })?;
        }
        Ok(())
    }
}

// Listings show the time of day for entries modified within roughly half a year, the year otherwise.
const RECENT: Duration = Duration::from_secs(182 * 24 * 60 * 60);

/// Fileinfo contains the path and `Metadata` of a file.
#[derive(Clone, Debug)]
pub struct Fileinfo<P, M>
where
    P: AsRef<Path>,
    M: Metadata,
{
    /// The full path to the file
    pub path: P,
    /// The file's metadata
    pub metadata: M,
}

impl<P, M> Fileinfo<P, M>
where
    P: AsRef<Path>,
    M: Metadata,
{
    /// The last path component, as shown in `NLST` output.
    pub fn basename(&self) -> Option<String> {
        self.path.as_ref().file_name().map(|n| n.to_string_lossy().to_string())
    }
}

impl<P, M> std::fmt::Display for Fileinfo<P, M>
where
    P: AsRef<Path>,
    M: Metadata,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let modified: String = self
            .metadata
            .modified()
            .map(|x| {
                let recent = SystemTime::now().duration_since(x).map(|age| age < RECENT).unwrap_or(true);
                let format = if recent { "%b %d %H:%M" } else { "%b %d  %Y" };
                DateTime::<Utc>::from(x).format(format).to_string()
            })
            .unwrap_or_else(|_| "--- -- --:--".to_string());
        let basename = self.path.as_ref().components().next_back();
        let path = match basename {
            Some(v) => v.as_os_str().to_string_lossy(),
            None => {
                return Err(std::fmt::Error);
            }
        };
        write!(
            f,
            "{filetype}{permissions} {links:>3} {owner:>5} {group:>5} {size:>12} {modified} {path}",
            filetype = if self.metadata.is_dir() {
                "d"
            } else if self.metadata.is_symlink() {
                "l"
            } else {
                "-"
            },
            permissions = self.metadata.permissions(),
            links = self.metadata.links(),
            owner = self.metadata.uid(),
            group = self.metadata.gid(),
            size = self.metadata.len(),
            modified = modified,
            path = path,
        )?;
        if let Some(target) = self.metadata.readlink() {
            write!(f, " -> {}", target.display())?;
        }
        Ok(())
    }
}

/// How [`Driver::open_write`] treats existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Discard everything from the given offset onwards, then write from the offset (`STOR`).
    Truncate,
    /// Keep existing content and write at the end of the file (`APPE`). The offset is ignored.
    Append,
}

/// The `Driver` trait can be implemented to create custom FTP virtual file systems. A fresh
/// driver is created for every session by the factory registered with the server; once the user
/// logged in, [`enter`](Driver::enter) scopes it to that user's root.
///
/// All paths are absolute paths within the user's virtual tree (e.g. `/docs/readme.txt`). A
/// driver must never resolve them to anything outside of the user's root.
#[async_trait]
pub trait Driver<User: UserDetail>: Send + Sync + Debug {
    /// The concrete type of the _metadata_ used by this driver.
    type Metadata: Metadata + Sync + Send + 'static;

    /// Implement to set the name of the driver. By default it returns the type signature.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Scopes the driver to the given user, typically by moving its root to the user's home
    /// directory. Called once, right after a successful login.
    fn enter(&mut self, _user: &User) -> io::Result<()> {
        Ok(())
    }

    /// Returns the `Metadata` for the given path.
    async fn stat<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<Self::Metadata>;

    /// Returns the entries of the given directory, sorted by name.
    async fn list<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<Vec<Fileinfo<PathBuf, Self::Metadata>>>
    where
        <Self as Driver<User>>::Metadata: Metadata;

    /// Returns some bytes that make up a `LIST` directory listing that can immediately be sent to
    /// the client. If `path` is a file, the listing contains just that file.
    #[allow(clippy::type_complexity)]
    #[tracing_attributes::instrument]
    async fn list_fmt<P>(&self, user: &User, path: P) -> Result<Vec<u8>>
    where
        P: AsRef<Path> + Send + Debug,
        Self::Metadata: Metadata + 'static,
    {
        let list = self.list_or_file(user, path.as_ref()).await?;
        Ok(list.iter().map(|fi| format!("{}\r\n", fi)).collect::<String>().into_bytes())
    }

    /// Returns some bytes that make up a `NLST` directory listing (only the basename) that can
    /// immediately be sent to the client.
    #[allow(clippy::type_complexity)]
    #[tracing_attributes::instrument]
    async fn nlst_fmt<P>(&self, user: &User, path: P) -> Result<Vec<u8>>
    where
        P: AsRef<Path> + Send + Debug,
        Self::Metadata: Metadata + 'static,
    {
        let list = self.list_or_file(user, path.as_ref()).await?;
        Ok(list
            .iter()
            .filter_map(|fi| fi.basename())
            .map(|name| format!("{}\r\n", name))
            .collect::<String>()
            .into_bytes())
    }

    /// Lists a directory, or yields a single entry when the path names something else.
    async fn list_or_file(&self, user: &User, path: &Path) -> Result<Vec<Fileinfo<PathBuf, Self::Metadata>>>
    where
        Self::Metadata: Metadata + 'static,
    {
        let meta = self.stat(user, path).await?;
        if meta.is_dir() {
            self.list(user, path).await
        } else {
            Ok(vec![Fileinfo {
                path: path.to_path_buf(),
                metadata: meta,
            }])
        }
    }

    /// Opens the given file for reading, positioned at `offset`.
    async fn open_read<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P, offset: u64) -> Result<ReadStream>;

    /// Opens the given file for writing, creating it when it does not exist. See [`WriteMode`].
    async fn open_write<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P, offset: u64, mode: WriteMode) -> Result<WriteStream>;

    /// Creates the given directory.
    async fn mkdir<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()>;

    /// Removes the given file, or the given directory if it is empty.
    async fn remove<P: AsRef<Path> + Send + Debug>(&self, user: &User, path: P) -> Result<()>;

    /// Renames the given file or directory.
    async fn rename<P: AsRef<Path> + Send + Debug>(&self, user: &User, from: P, to: P) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct MockMetadata {
        dir: bool,
        modified: SystemTime,
    }

    impl Metadata for MockMetadata {
        fn len(&self) -> u64 {
            5
        }
        fn is_dir(&self) -> bool {
            self.dir
        }
        fn is_file(&self) -> bool {
            !self.dir
        }
        fn is_symlink(&self) -> bool {
            false
        }
        fn modified(&self) -> Result<SystemTime> {
            Ok(self.modified)
        }
        fn uid(&self) -> u32 {
            0
        }
        fn gid(&self) -> u32 {
            0
        }
    }

    #[test]
    fn permissions_display() {
        assert_eq!(Permissions(0o755).to_string(), "rwxr-xr-x");
        assert_eq!(Permissions(0o640).to_string(), "rw-r-----");
        assert_eq!(Permissions(0).to_string(), "---------");
    }

    #[test]
    fn fileinfo_fmt_old_file_shows_year() {
        let fileinfo = Fileinfo {
            path: "/some/dir/hello.txt",
            metadata: MockMetadata {
                dir: false,
                modified: SystemTime::UNIX_EPOCH,
            },
        };
        assert_eq!(fileinfo.to_string(), "-rwxr-xr-x   1     0     0            5 Jan 01  1970 hello.txt");
    }

    #[test]
    fn fileinfo_fmt_recent_dir_shows_time() {
        let fileinfo = Fileinfo {
            path: "sub",
            metadata: MockMetadata {
                dir: true,
                modified: SystemTime::now(),
            },
        };
        let line = fileinfo.to_string();
        assert!(line.starts_with("drwxr-xr-x   1     0     0            5 "));
        assert!(line.ends_with(" sub"));
        assert_eq!(line.matches(':').count(), 1);
    }

    #[test]
    fn fileinfo_basename() {
        let fileinfo = Fileinfo {
            path: "/a/b/c.bin",
            metadata: MockMetadata {
                dir: false,
                modified: SystemTime::UNIX_EPOCH,
            },
        };
        assert_eq!(fileinfo.basename().as_deref(), Some("c.bin"));
    }
}
