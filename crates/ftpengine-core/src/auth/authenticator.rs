//! The service provider interface (SPI) for authentication

use super::UserDetail;
use crate::BoxError;
use async_trait::async_trait;
use std::{fmt::Debug, net::IpAddr};
use thiserror::Error;

/// Defines the requirements for Authentication implementations
#[async_trait]
pub trait Authenticator<User>: Sync + Send + Debug
where
    User: UserDetail,
{
    /// Authenticate the given user with the given credentials. On success the principal that
    /// will be bound to the session is returned.
    async fn authenticate(&self, username: &str, creds: &Credentials) -> Result<User, AuthenticationError>;

    /// Implement to set the name of the authenticator. By default it returns the type signature.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// The error returned by an [`Authenticator`] when the supplied credentials are not accepted.
#[derive(Error, Debug)]
pub enum AuthenticationError {
    /// A bad password was provided
    #[error("bad password")]
    BadPassword,

    /// A bad username was provided
    #[error("bad username")]
    BadUser,

    /// The authentication back-end itself failed, for instance because its store is unreachable.
    #[error("authentication back-end error: {0}")]
    ImplPropagated(String, #[source] Option<BoxError>),
}

impl AuthenticationError {
    /// Creates a new back-end failure with the given message and optional cause
    pub fn new(msg: impl Into<String>) -> AuthenticationError {
        AuthenticationError::ImplPropagated(msg.into(), None)
    }

    /// Creates a new back-end failure that wraps the given error
    pub fn with_source<E>(msg: impl Into<String>, source: E) -> AuthenticationError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AuthenticationError::ImplPropagated(msg.into(), Some(Box::new(source)))
    }
}

/// Input credentials to an [`Authenticator`]
#[derive(Clone, Debug)]
pub struct Credentials {
    /// The password that the client sent.
    pub password: Option<String>,
    /// The IP address of the user's connection
    pub source_ip: IpAddr,
}

impl From<&str> for Credentials {
    fn from(s: &str) -> Self {
        Credentials {
            password: Some(String::from(s)),
            source_ip: IpAddr::from([127, 0, 0, 1]),
        }
    }
}
