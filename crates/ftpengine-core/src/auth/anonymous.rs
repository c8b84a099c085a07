//! This module provides an anonymous authenticator

use super::{AuthenticationError, Authenticator, Credentials, DefaultUser};
use async_trait::async_trait;

///
/// [`Authenticator`] implementation that simply allows everyone.
///
/// # Example
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use ftpengine_core::auth::{Authenticator, AnonymousAuthenticator, DefaultUser};
///
/// let my_auth = AnonymousAuthenticator {};
/// assert_eq!(my_auth.authenticate("Finn", &"I ❤️ PB".into()).await.unwrap(), DefaultUser {});
/// # }
/// ```
///
#[derive(Debug)]
pub struct AnonymousAuthenticator;

#[async_trait]
impl Authenticator<DefaultUser> for AnonymousAuthenticator {
    #[allow(clippy::type_complexity)]
    #[tracing_attributes::instrument(skip(_creds))]
    async fn authenticate(&self, _username: &str, _creds: &Credentials) -> Result<DefaultUser, AuthenticationError> {
        Ok(DefaultUser {})
    }
}
