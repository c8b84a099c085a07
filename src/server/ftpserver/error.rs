//! Contains the error type used by `Server`

use crate::BoxError;

use thiserror::Error;

/// Error returned by the [`ServerBuilder::build`](crate::ServerBuilder::build),
/// [`Server::start`](crate::Server::start) and [`Server::listen`](crate::Server::listen) methods
#[derive(Error, Debug)]
#[error("server error: {msg}")]
pub struct ServerError {
    msg: String,
    #[source]
    source: Option<BoxError>,
}

impl ServerError {
    pub(crate) fn new<E: std::error::Error + Send + Sync + 'static>(msg: impl Into<String>, source: E) -> ServerError {
        ServerError {
            msg: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// An invalid setting passed to the builder.
    pub(crate) fn config(msg: impl Into<String>) -> ServerError {
        ServerError {
            msg: msg.into(),
            source: None,
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        ServerError::new("io error", e)
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(e: tokio::task::JoinError) -> Self {
        ServerError::new("the supervisor task failed", e)
    }
}
