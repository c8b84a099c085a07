use crate::BoxError;
use derive_more::Display;
use thiserror::Error;

/// The Error returned by drivers. Driver implementations should choose the `ErrorKind` for their
/// errors carefully since that determines the reply sent to the FTP client.
#[derive(Debug, Error)]
#[error("storage error: {kind}")]
pub struct Error {
    kind: ErrorKind,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    /// Creates a new storage error
    pub fn new<E>(kind: ErrorKind, error: E) -> Error
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error {
            kind,
            source: Some(error.into()),
        }
    }

    /// Detailed information about what the FTP server should do with the failure
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Attempts to get a reference to the inner `std::io::Error` if there is one.
    pub fn get_io_error(&self) -> Option<&std::io::Error> {
        self.source.as_ref()?.downcast_ref::<std::io::Error>()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { kind, source: None }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory | std::io::ErrorKind::IsADirectory => {
                Error::new(ErrorKind::NotFound, err)
            }
            std::io::ErrorKind::PermissionDenied => Error::new(ErrorKind::PermissionDenied, err),
            std::io::ErrorKind::DirectoryNotEmpty => Error::new(ErrorKind::DirectoryNotEmpty, err),
            std::io::ErrorKind::StorageFull => Error::new(ErrorKind::InsufficientStorageSpace, err),
            std::io::ErrorKind::InvalidFilename => Error::new(ErrorKind::FileNameNotAllowed, err),
            _ => Error::new(ErrorKind::LocalError, err),
        }
    }
}

/// The `ErrorKind` variants that can be produced by [`Driver`] implementations. The display
/// form starts with the FTP reply code the server answers with.
///
/// [`Driver`]: super::Driver
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum ErrorKind {
    /// The file or directory does not exist, or is not of the expected type.
    #[display("550 File not found")]
    NotFound,
    /// The driver refused access to the path.
    #[display("550 Permission denied")]
    PermissionDenied,
    /// A directory could not be removed because it still has entries.
    #[display("550 The directory is not empty")]
    DirectoryNotEmpty,
    /// The requested action was not taken due to an illegal file name.
    #[display("553 File name not allowed")]
    FileNameNotAllowed,
    /// Insufficient storage space in the system.
    #[display("452 Insufficient storage space")]
    InsufficientStorageSpace,
    /// The requested action was aborted due to a local error (internal driver error).
    #[display("451 Local error")]
    LocalError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn io_errors_map_to_kinds() {
        let e: Error = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert_eq!(e.kind(), ErrorKind::NotFound);
        assert!(e.get_io_error().is_some());

        let e: Error = std::io::Error::from(std::io::ErrorKind::PermissionDenied).into();
        assert_eq!(e.kind(), ErrorKind::PermissionDenied);

        // Writing to a directory
        let e: Error = std::io::Error::from(std::io::ErrorKind::IsADirectory).into();
        assert_eq!(e.kind(), ErrorKind::NotFound);

        let e: Error = std::io::Error::other("disk on fire").into();
        assert_eq!(e.kind(), ErrorKind::LocalError);
    }

    #[test]
    fn kind_display_starts_with_reply_code() {
        assert_eq!(ErrorKind::NotFound.to_string(), "550 File not found");
        assert_eq!(ErrorKind::FileNameNotAllowed.to_string(), "553 File name not allowed");
        assert_eq!(ErrorKind::LocalError.to_string(), "451 Local error");
    }
}
