//! Contains the [`Driver`] trait that can be implemented to create virtual file systems for
//! libftpengine.
//!
//! To create a new driver:
//!
//! 1. Declare dependencies on the async-trait, tokio, and ftpengine-core crates:
//!
//! ```toml
//! async-trait = "0.1.88"
//! tokio = { version = "1.49.0", features = ["full"] }
//! ftpengine-core = { path = "../path/to/ftpengine-core" }
//! ```
//!
//! 2. Implement the [`Driver`] trait and the [`Metadata`] trait:
//!
//! ```no_run
//! use async_trait::async_trait;
//! use ftpengine_core::{
//!   auth::DefaultUser,
//!   storage::{Driver, Fileinfo, Metadata, ReadStream, Result, WriteMode, WriteStream},
//! };
//! use std::{
//!   fmt::Debug,
//!   path::{Path, PathBuf},
//!   time::SystemTime
//! };
//!
//! #[derive(Debug)]
//! pub struct Vfs {}
//!
//! #[derive(Debug)]
//! pub struct Meta {
//!     inner: std::fs::Metadata,
//! }
//!
//! #[async_trait]
//! impl Driver<DefaultUser> for Vfs {
//!     type Metadata = Meta;
//!
//!     async fn stat<P: AsRef<Path> + Send + Debug>(&self, user: &DefaultUser, path: P) -> Result<Self::Metadata> {
//!         unimplemented!()
//!     }
//!
//!     async fn list<P: AsRef<Path> + Send + Debug>(&self, user: &DefaultUser, path: P) -> Result<Vec<Fileinfo<PathBuf, Self::Metadata>>>
//!     where
//!         <Self as Driver<DefaultUser>>::Metadata: Metadata,
//!     {
//!         unimplemented!()
//!     }
//!
//!     async fn open_read<P: AsRef<Path> + Send + Debug>(&self, user: &DefaultUser, path: P, offset: u64) -> Result<ReadStream> {
//!         unimplemented!()
//!     }
//!
//!     async fn open_write<P: AsRef<Path> + Send + Debug>(&self, user: &DefaultUser, path: P, offset: u64, mode: WriteMode) -> Result<WriteStream> {
//!         unimplemented!()
//!     }
//!
//!     async fn mkdir<P: AsRef<Path> + Send + Debug>(&self, user: &DefaultUser, path: P) -> Result<()> {
//!         unimplemented!()
//!     }
//!
//!     async fn remove<P: AsRef<Path> + Send + Debug>(&self, user: &DefaultUser, path: P) -> Result<()> {
//!         unimplemented!()
//!     }
//!
//!     async fn rename<P: AsRef<Path> + Send + Debug>(&self, user: &DefaultUser, from: P, to: P) -> Result<()> {
//!         unimplemented!()
//!     }
//! }
//!
//! impl Metadata for Meta {
//!     fn len(&self) -> u64 {
//!         self.inner.len()
//!     }
//!
//!     fn is_dir(&self) -> bool {
//!         self.inner.is_dir()
//!     }
//!
//!     fn is_file(&self) -> bool {
//!         self.inner.is_file()
//!     }
//!
//!     fn is_symlink(&self) -> bool {
//!        self.inner.file_type().is_symlink()
//!     }
//!
//!     fn modified(&self) -> Result<SystemTime> {
//!         self.inner.modified().map_err(|e| e.into())
//!     }
//!
//!     fn gid(&self) -> u32 {
//!         0
//!     }
//!
//!     fn uid(&self) -> u32 {
//!         0
//!     }
//! }
//! ```
//!
//! 3. Register a factory for it with the server in your application.
//!

mod error;
pub use error::{Error, ErrorKind};

mod driver;
pub use driver::{Driver, Fileinfo, Metadata, Permissions, ReadStream, Result, WriteMode, WriteStream};
