//! Contains the `ControlChanError` struct that that defines the control channel error type.

use crate::{BoxError, storage};

use derive_more::Display;
use thiserror::Error;

/// The error type returned by command handlers and the control channel codec.
#[derive(Debug, Error)]
#[error("control channel error: {kind}")]
pub(crate) struct ControlChanError {
    kind: ControlChanErrorKind,
    #[source]
    source: Option<BoxError>,
}

/// A list specifying categories of control channel errors. It is meant to be used with the
/// [ControlChanError] type.
#[derive(Eq, PartialEq, Debug, Display, Clone, Copy)]
pub(crate) enum ControlChanErrorKind {
    /// We encountered a system IO error.
    #[display("Failed to perform IO")]
    IoError,
    /// The storage driver failed. The inner kind determines the reply.
    #[display("Storage error: {_0}")]
    StorageError(storage::ErrorKind),
    /// The session is not in the state a handler expects, e.g. no driver after login.
    #[display("Control channel in illegal state")]
    IllegalState,
}

impl ControlChanErrorKind {
    /// A short, fixed name for the kind, used to label metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ControlChanErrorKind::IoError => "io",
            ControlChanErrorKind::StorageError(kind) => match kind {
                storage::ErrorKind::NotFound => "storage_not_found",
                storage::ErrorKind::PermissionDenied => "storage_permission_denied",
                storage::ErrorKind::DirectoryNotEmpty => "storage_directory_not_empty",
                storage::ErrorKind::FileNameNotAllowed => "storage_file_name_not_allowed",
                storage::ErrorKind::InsufficientStorageSpace => "storage_insufficient_space",
                storage::ErrorKind::LocalError => "storage_local_error",
            },
            ControlChanErrorKind::IllegalState => "illegal_state",
        }
    }
}

impl ControlChanError {
    /// Return the inner error kind of this error.
    pub fn kind(&self) -> ControlChanErrorKind {
        self.kind
    }
}

impl From<ControlChanErrorKind> for ControlChanError {
    fn from(kind: ControlChanErrorKind) -> ControlChanError {
        ControlChanError { kind, source: None }
    }
}

impl From<std::io::Error> for ControlChanError {
    fn from(err: std::io::Error) -> ControlChanError {
        ControlChanError {
            kind: ControlChanErrorKind::IoError,
            source: Some(Box::new(err)),
        }
    }
}

impl From<storage::Error> for ControlChanError {
    fn from(err: storage::Error) -> ControlChanError {
        ControlChanError {
            kind: ControlChanErrorKind::StorageError(err.kind()),
            source: Some(Box::new(err)),
        }
    }
}
