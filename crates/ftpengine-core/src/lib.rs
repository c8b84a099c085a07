//! Core traits and types shared by the libftpengine server, its storage drivers and its
//! authentication back-ends.

pub mod auth;
pub mod storage;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
