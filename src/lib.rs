#![cfg_attr(docsrs, feature(doc_cfg))]

//! libftpengine is an extensible, async FTP server engine.
//!
//! It speaks the control and data protocol of RFC 959 (with the RFC 2428 extended addressing
//! commands and a handful of RFC 3659 ones) and leaves storage and authentication to you: files
//! live behind a [`Driver`](storage::Driver) and logins are checked by an
//! [`Authenticator`](auth::Authenticator). The companion crates `ftpengine-driver-fs` and
//! `ftpengine-auth-jsonfile` provide a local filesystem driver and a JSON file user database.
//!
//! # Quick Start
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

pub use ftpengine_core::{auth, storage};

mod metrics;
mod server;

pub use crate::server::ftpserver::{Server, ServerBuilder, ServerHandle, error::ServerError, options};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
