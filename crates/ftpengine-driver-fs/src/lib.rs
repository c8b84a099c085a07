//! A libftpengine [`Driver`] that uses a local filesystem, like a traditional FTP server.
//!
//! Here is an example for using this driver
//!
//! ```no_run
//! use ftpengine_driver_fs::Filesystem;
//! use libftpengine::ServerBuilder;
//!
//! #[tokio::main]
//! pub async fn main() {
//!     let ftp_home = std::env::temp_dir();
//!     let server = ServerBuilder::new(Box::new(move || Filesystem::new(ftp_home.clone()).unwrap()))
//!         .greeting("Welcome to my FTP server")
//!         .passive_ports(50000..=65535)
//!         .build()
//!         .unwrap();
//!
//!     server.listen("127.0.0.1:2121").await.unwrap();
//! }
//! ```
//!
//! All paths are resolved through a [`cap_std::fs::Dir`] capability, so neither `..` components nor
//! symlinks can reach outside of the configured root.

mod cap_fs;

use async_trait::async_trait;
use cfg_if::cfg_if;
use ftpengine_core::auth::UserDetail;
use ftpengine_core::storage::{Driver, Error, ErrorKind, Fileinfo, Metadata, Permissions, ReadStream, Result, WriteMode, WriteStream};
use futures::{future::TryFutureExt, stream::TryStreamExt};
use lazy_static::lazy_static;
use std::{
    fmt::Debug,
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};
use tokio::io::AsyncSeekExt;

#[cfg(unix)]
use cap_std::fs::{MetadataExt, PermissionsExt};

const BUFFER_SIZE: usize = 64 * 1024;

/// The Filesystem struct is an implementation of the [`Driver`] trait that keeps its files
/// inside a specific root directory on local disk.
#[derive(Debug, Clone)]
pub struct Filesystem {
    // Shared with the blocking tasks in cap_fs.
    root_fd: Arc<cap_std::fs::Dir>,
    root: PathBuf,
}

/// Metadata for the filesystem driver
#[derive(Debug)]
pub struct Meta {
    inner: cap_std::fs::Metadata,
    target: Option<PathBuf>,
}

/// Strip the "/" prefix, if any, from a path.  Suitable for preprocessing the input pathnames
/// supplied by the FTP client.
fn strip_prefixes(path: &Path) -> &Path {
    lazy_static! {
        static ref DOT: PathBuf = PathBuf::from(".");
        static ref SLASH: PathBuf = PathBuf::from("/");
    }
    if path == SLASH.as_path() || path.as_os_str().is_empty() {
        DOT.as_path()
    } else {
        path.strip_prefix("/").unwrap_or(path)
    }
}

impl Filesystem {
    /// Create a new Filesystem driver, with the given root. No operations can take place outside
    /// of the root. For example, when the `Filesystem` root is set to `/srv/ftp`, and a client
    /// asks for `hello.txt`, the server will send it `/srv/ftp/hello.txt`.
    pub fn new<P: Into<PathBuf>>(root: P) -> io::Result<Self> {
        let path = root.into();
        let aa = cap_std::ambient_authority();
        let root_fd = Arc::new(cap_std::fs::Dir::open_ambient_dir(&path, aa)?);
        Ok(Filesystem { root_fd, root: path })
    }

    /// The directory on local disk that this driver serves from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn meta(&self, path: &Path) -> io::Result<Meta> {
        let inner = cap_fs::symlink_metadata(self.root_fd.clone(), path).await?;
        let target = if inner.is_symlink() {
            cap_fs::read_link(self.root_fd.clone(), path).await.ok()
        } else {
            None
        };
        Ok(Meta { inner, target })
    }
}

#[async_trait]
impl<User: UserDetail> Driver<User> for Filesystem {
    type Metadata = Meta;

    fn enter(&mut self, user_detail: &User) -> io::Result<()> {
        if let Some(path) = user_detail.home() {
            let relpath = strip_prefixes(path.strip_prefix(self.root.as_path()).unwrap_or(path));
            if relpath != Path::new(".") {
                self.root_fd = Arc::new(self.root_fd.open_dir(relpath)?);
                self.root = self.root.join(relpath);
            }
        }
        Ok(())
    }

    #[tracing_attributes::instrument]
    async fn stat<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<Self::Metadata> {
        let path = strip_prefixes(path.as_ref());
        Ok(self.meta(path).await?)
    }

    #[allow(clippy::type_complexity)]
    #[tracing_attributes::instrument]
    async fn list<P>(&self, _user: &User, path: P) -> Result<Vec<Fileinfo<PathBuf, Self::Metadata>>>
    where
        P: AsRef<Path> + Send + Debug,
        <Self as Driver<User>>::Metadata: Metadata,
    {
        let path = strip_prefixes(path.as_ref());

        let mut fis: Vec<Fileinfo<PathBuf, Self::Metadata>> = cap_fs::read_dir(self.root_fd.clone(), path)
            .and_then(|dirent| {
                let entry_path: PathBuf = dirent.file_name().into();
                let fullpath = path.join(&entry_path);
                async move { self.meta(&fullpath).await }.map_ok(move |metadata| Fileinfo { path: entry_path, metadata })
            })
            .try_collect::<Vec<_>>()
            .await?;
        fis.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(fis)
    }

    #[tracing_attributes::instrument]
    async fn open_read<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P, offset: u64) -> Result<ReadStream> {
        let path = strip_prefixes(path.as_ref());
        let file = cap_fs::open(self.root_fd.clone(), path).await?;
        if file.metadata()?.is_dir() {
            return Err(Error::from(ErrorKind::NotFound));
        }
        let mut file = tokio::fs::File::from_std(file.into_std());
        if offset > 0 {
            file.seek(std::io::SeekFrom::Start(offset)).await?;
        }

        Ok(Box::new(tokio::io::BufReader::with_capacity(BUFFER_SIZE, file)) as ReadStream)
    }

    #[tracing_attributes::instrument]
    async fn open_write<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P, offset: u64, mode: WriteMode) -> Result<WriteStream> {
        let path = strip_prefixes(path.as_ref());
        let mut oo = cap_std::fs::OpenOptions::new();
        match mode {
            WriteMode::Truncate => oo.write(true).create(true),
            WriteMode::Append => oo.append(true).create(true),
        };
        let file = cap_fs::open_with(self.root_fd.clone(), path, oo).await?;
        let mut file = tokio::fs::File::from_std(file.into_std());
        if mode == WriteMode::Truncate {
            file.set_len(offset).await?;
            file.seek(std::io::SeekFrom::Start(offset)).await?;
        }

        Ok(Box::new(tokio::io::BufWriter::with_capacity(BUFFER_SIZE, file)) as WriteStream)
    }

    #[tracing_attributes::instrument]
    async fn mkdir<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<()> {
        let path = strip_prefixes(path.as_ref());
        cap_fs::create_dir(self.root_fd.clone(), path)
            .await
            .map_err(|error: std::io::Error| error.into())
    }

    #[tracing_attributes::instrument]
    async fn remove<P: AsRef<Path> + Send + Debug>(&self, _user: &User, path: P) -> Result<()> {
        let path = strip_prefixes(path.as_ref());
        if path == Path::new(".") {
            return Err(Error::from(ErrorKind::PermissionDenied));
        }
        let metadata = cap_fs::symlink_metadata(self.root_fd.clone(), path).await?;
        let r = if metadata.is_dir() {
            cap_fs::remove_dir(self.root_fd.clone(), path).await
        } else {
            cap_fs::remove_file(self.root_fd.clone(), path).await
        };
        r.map_err(|error: std::io::Error| error.into())
    }

    #[tracing_attributes::instrument]
    async fn rename<P: AsRef<Path> + Send + Debug>(&self, _user: &User, from: P, to: P) -> Result<()> {
        let from = strip_prefixes(from.as_ref());
        let to = strip_prefixes(to.as_ref());

        let metadata = cap_fs::symlink_metadata(self.root_fd.clone(), from).await?;
        if metadata.is_file() || metadata.is_dir() || metadata.is_symlink() {
            cap_fs::rename(self.root_fd.clone(), from, to).await.map_err(|e| e.into())
        } else {
            Err(Error::from(ErrorKind::NotFound))
        }
    }
}

impl Metadata for Meta {
    fn len(&self) -> u64 {
        self.inner.len()
    }

    fn is_dir(&self) -> bool {
        self.inner.is_dir()
    }

    fn is_file(&self) -> bool {
        self.inner.is_file()
    }

    fn is_symlink(&self) -> bool {
        self.inner.file_type().is_symlink()
    }

    fn modified(&self) -> Result<SystemTime> {
        self.inner.modified().map(cap_std::time::SystemTime::into_std).map_err(|e| e.into())
    }

    fn gid(&self) -> u32 {
        cfg_if! {
            if #[cfg(unix)] {
                self.inner.gid()
            } else {
                0
            }
        }
    }

    fn uid(&self) -> u32 {
        cfg_if! {
            if #[cfg(unix)] {
                self.inner.uid()
            } else {
                0
            }
        }
    }

    fn links(&self) -> u64 {
        cfg_if! {
            if #[cfg(unix)] {
                self.inner.nlink()
            } else {
                1
            }
        }
    }

    fn permissions(&self) -> Permissions {
        cfg_if! {
            if #[cfg(unix)] {
                Permissions(self.inner.permissions().mode() & 0o777)
            } else {
                Permissions(0o755)
            }
        }
    }

    fn readlink(&self) -> Option<&Path> {
        self.target.as_deref()
    }
}
