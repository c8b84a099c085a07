//! Contains the [`Authenticator`], [`Authorizer`] and [`UserDetail`] traits used by libftpengine
//! authentication back-ends.
//!
//! The server calls the [`Authenticator`] exactly once per login attempt (on `PASS`) and consults
//! the [`Authorizer`] before every operation that reads from or changes the user's file tree. You
//! can define your own implementations to integrate with whatever identity store you need. For
//! example, to define an `Authenticator` that lets everybody in as the same user:
//!
//! 1. Declare dependencies on async-trait and ftpengine-core
//!
//! ```toml
//! async-trait = "0.1.88"
//! ftpengine-core = { path = "../path/to/ftpengine-core" }
//! ```
//!
//! 2. Implement the [`Authenticator`] trait:
//!
//! ```no_run
//! use ftpengine_core::auth::{Authenticator, AuthenticationError, Credentials, DefaultUser};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! struct WelcomeAll;
//!
//! #[async_trait]
//! impl Authenticator<DefaultUser> for WelcomeAll {
//!     async fn authenticate(&self, _username: &str, _creds: &Credentials) -> Result<DefaultUser, AuthenticationError> {
//!         Ok(DefaultUser {})
//!     }
//! }
//! ```

mod anonymous;
pub use anonymous::AnonymousAuthenticator;

mod authenticator;
pub use authenticator::{AuthenticationError, Authenticator, Credentials};

mod authorizer;
pub use authorizer::{AllowAll, Authorizer, Operation};

mod user;
pub use user::{DefaultUser, UserDetail};
