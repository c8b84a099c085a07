//! [`Authenticator`] and [`Authorizer`] implementation that authenticates against a JSON file.
//!
//! Passwords are stored either in plain text or as PBKDF2-HMAC-SHA512 keys. Every entry may carry
//! a home directory (relative to the driver's root) and a list of permitted operations.
//! Example credentials file:
//!
//! ```json
//! [
//!   {
//!     "username": "testuser1",
//!     "password": "plain text password"
//!   },
//!   {
//!     "username": "testuser2",
//!     "pbkdf2_salt": "testuser2.example.com",
//!     "pbkdf2_key": "<<BASE_64_KDF>>",
//!     "pbkdf2_iter": 500000,
//!     "home": "/testuser2",
//!     "permissions": ["read", "list"]
//!   }
//! ]
//! ```
//!
//! Valid permission names are `read`, `write`, `list`, `delete` and `rename`. Users without a
//! `permissions` list may do everything.
//!
//! [`Authenticator`]: ftpengine_core::auth::Authenticator
//! [`Authorizer`]: ftpengine_core::auth::Authorizer

use async_trait::async_trait;
use base64::Engine;
use bitflags::bitflags;
use ftpengine_core::auth::{AuthenticationError, Authenticator, Authorizer, Credentials, Operation, UserDetail};
use ring::{
    digest::SHA512_OUTPUT_LEN,
    hmac,
    pbkdf2::{PBKDF2_HMAC_SHA512, verify},
};
use serde::Deserialize;
use std::{
    collections::{BTreeSet, HashMap},
    fmt, fs,
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::time::sleep;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// Unknown users are answered only after this delay so that valid user names can't be told apart by timing.
const UNKNOWN_USER_DELAY: Duration = Duration::from_millis(1500);

#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
struct UserEntry {
    username: String,
    password: Option<String>,
    pbkdf2_salt: Option<String>,
    pbkdf2_key: Option<String>,
    pbkdf2_iter: Option<NonZeroU32>,
    home: Option<PathBuf>,
    permissions: Option<Vec<String>>,
}

bitflags! {
    /// The set of operations a user from the JSON file may perform.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UserPermissions: u32 {
        /// Download files and query their metadata
        const READ = 0b00001;
        /// Upload files and create directories
        const WRITE = 0b00010;
        /// List and enter directories
        const LIST = 0b00100;
        /// Remove files and directories
        const DELETE = 0b01000;
        /// Rename files and directories
        const RENAME = 0b10000;
    }
}

impl UserPermissions {
    fn parse(names: &[String]) -> Result<UserPermissions, BoxError> {
        names.iter().try_fold(UserPermissions::empty(), |acc, name| {
            let flag = match name.to_lowercase().as_str() {
                "read" => UserPermissions::READ,
                "write" => UserPermissions::WRITE,
                "list" => UserPermissions::LIST,
                "delete" => UserPermissions::DELETE,
                "rename" => UserPermissions::RENAME,
                other => return Err(format!("unknown permission '{}'", other).into()),
            };
            Ok(acc | flag)
        })
    }

    fn allows(&self, op: Operation) -> bool {
        let needed = match op {
            Operation::Read => UserPermissions::READ,
            Operation::Write => UserPermissions::WRITE,
            Operation::List => UserPermissions::LIST,
            Operation::Delete => UserPermissions::DELETE,
            Operation::Rename => UserPermissions::RENAME,
        };
        self.contains(needed)
    }
}

/// The user returned by [`JsonFileAuthenticator`] after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonUser {
    username: String,
    home: Option<PathBuf>,
    permissions: UserPermissions,
}

impl JsonUser {
    /// The name the user logged in with
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The operations this user may perform
    pub fn permissions(&self) -> UserPermissions {
        self.permissions
    }
}

impl UserDetail for JsonUser {
    fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }
}

impl fmt::Display for JsonUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}

#[derive(Clone)]
enum Password {
    Plain(String),
    Pbkdf2 {
        salt: String,
        key: [u8; SHA512_OUTPUT_LEN],
        iter: NonZeroU32,
    },
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Password::Plain(_) => write!(f, "Plain(*******)"),
            Password::Pbkdf2 { iter, .. } => write!(f, "Pbkdf2 {{ iter: {} }}", iter),
        }
    }
}

impl Password {
    fn verify(&self, given: &str) -> bool {
        match self {
            Password::Plain(expected) => plain_matches(expected, given),
            Password::Pbkdf2 { salt, key, iter } => verify(PBKDF2_HMAC_SHA512, *iter, salt.as_bytes(), given.as_bytes(), key).is_ok(),
        }
    }
}

// Compares the MACs of both passwords. The tag check takes the same time wherever they differ.
fn plain_matches(expected: &str, given: &str) -> bool {
    let key = hmac::Key::new(hmac::HMAC_SHA256, PLAIN_COMPARE_KEY);
    let tag = hmac::sign(&key, expected.as_bytes());
    hmac::verify(&key, given.as_bytes(), tag.as_ref()).is_ok()
}

const PLAIN_COMPARE_KEY: &[u8] = b"ftpengine-auth-jsonfile plaintext";

#[derive(Clone, Debug)]
struct UserRecord {
    password: Password,
    home: Option<PathBuf>,
    permissions: UserPermissions,
}

/// [`Authenticator`](ftpengine_core::auth::Authenticator) implementation that authenticates
/// against a JSON list of users. It also acts as the
/// [`Authorizer`](ftpengine_core::auth::Authorizer) for the users it authenticated.
#[derive(Clone, Debug)]
pub struct JsonFileAuthenticator {
    db: HashMap<String, UserRecord>,
}

impl JsonFileAuthenticator {
    /// Initialize a new [`JsonFileAuthenticator`] from file.
    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self, BoxError> {
        let json: String = fs::read_to_string(filename)?;

        JsonFileAuthenticator::from_json(json)
    }

    /// Initialize a new [`JsonFileAuthenticator`] from json string.
    pub fn from_json<T: Into<String>>(json: T) -> Result<Self, BoxError> {
        let entries: Vec<UserEntry> = serde_json::from_str::<Vec<UserEntry>>(&json.into())?;

        let salts: Vec<&String> = entries.iter().filter_map(|e| e.pbkdf2_salt.as_ref()).collect();
        let unique: BTreeSet<&String> = salts.iter().copied().collect();
        if salts.len() != unique.len() {
            return Err("PBKDF2 salts have to be unique".into());
        }

        let mut db = HashMap::with_capacity(entries.len());
        for entry in entries {
            let username = entry.username.clone();
            let record = UserRecord::try_from(entry)?;
            if db.insert(username.clone(), record).is_some() {
                return Err(format!("duplicate user '{}'", username).into());
            }
        }
        Ok(JsonFileAuthenticator { db })
    }
}

impl TryFrom<UserEntry> for UserRecord {
    type Error = BoxError;

    fn try_from(entry: UserEntry) -> Result<Self, Self::Error> {
        let password = match (entry.password, entry.pbkdf2_salt, entry.pbkdf2_key, entry.pbkdf2_iter) {
            (Some(plain), None, None, None) => Password::Plain(plain),
            (None, Some(salt), Some(key), Some(iter)) => {
                let key: [u8; SHA512_OUTPUT_LEN] = base64::engine::general_purpose::STANDARD
                    .decode(key)?
                    .try_into()
                    .map_err(|_| format!("pbkdf2_key of '{}' must decode to {} bytes", entry.username, SHA512_OUTPUT_LEN))?;
                Password::Pbkdf2 { salt, key, iter }
            }
            _ => {
                return Err(format!(
                    "user '{}' needs either a password or all of pbkdf2_salt, pbkdf2_key and pbkdf2_iter",
                    entry.username
                )
                .into());
            }
        };
        let permissions = match entry.permissions {
            Some(names) => UserPermissions::parse(&names)?,
            None => UserPermissions::all(),
        };
        Ok(UserRecord {
            password,
            home: entry.home,
            permissions,
        })
    }
}

#[async_trait]
impl Authenticator<JsonUser> for JsonFileAuthenticator {
    #[tracing_attributes::instrument(skip(self, creds))]
    async fn authenticate(&self, username: &str, creds: &Credentials) -> Result<JsonUser, AuthenticationError> {
        let Some(record) = self.db.get(username) else {
            sleep(UNKNOWN_USER_DELAY).await;
            return Err(AuthenticationError::BadUser);
        };
        let given = creds.password.as_deref().ok_or(AuthenticationError::BadPassword)?;
        if record.password.verify(given) {
            Ok(JsonUser {
                username: username.to_string(),
                home: record.home.clone(),
                permissions: record.permissions,
            })
        } else {
            Err(AuthenticationError::BadPassword)
        }
    }
}

#[async_trait]
impl Authorizer<JsonUser> for JsonFileAuthenticator {
    #[tracing_attributes::instrument(skip(self))]
    async fn permit(&self, user: &JsonUser, path: &Path, op: Operation) -> bool {
        user.permissions.allows(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PBKDF2_USERS: &str = r#"[
  {
    "username": "alice",
    "pbkdf2_salt": "thisisabadsalt",
    "pbkdf2_key": "Egbi+LYfwn00V+HwFq146kmhoE4TYaqPFCA7mKkfzEpSZe2zMqXz/8LfA7HjYvXgiLzOuDij2wf50eKcWOcjYQ==",
    "pbkdf2_iter": 5000
  },
  {
    "username": "bella",
    "pbkdf2_salt": "thisisabadsalttoo",
    "pbkdf2_key": "9QSFDFRU80n1Jktu6s3Wo0XEArW3eQdw9zt4L9OBJjsGOYAsHfWqR4RKGwzve0Dih2M3Az+HHvKC9f43wYRRng==",
    "pbkdf2_iter": 5000,
    "home": "/bella",
    "permissions": ["read", "list"]
  }
]"#;

    #[tokio::test(flavor = "current_thread")]
    async fn test_json_auth() {
        let json_authenticator = JsonFileAuthenticator::from_json(PBKDF2_USERS).unwrap();
        assert_eq!(json_authenticator.authenticate("alice", &"not secret".into()).await.unwrap().username(), "alice");
        let bella = json_authenticator.authenticate("bella", &"also not secret".into()).await.unwrap();
        assert_eq!(bella.home(), Some(Path::new("/bella")));
        assert!(matches!(
            json_authenticator.authenticate("bella", &"bad secret".into()).await,
            Err(AuthenticationError::BadPassword)
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_plain_password() {
        let json_authenticator = JsonFileAuthenticator::from_json(r#"[{"username": "carol", "password": "hunter2"}]"#).unwrap();
        let carol = json_authenticator.authenticate("carol", &"hunter2".into()).await.unwrap();
        assert_eq!(carol.permissions(), UserPermissions::all());
        assert!(json_authenticator.authenticate("carol", &"hunter3".into()).await.is_err());
        assert!(json_authenticator.authenticate("carol", &"hunter".into()).await.is_err());
        assert!(json_authenticator.authenticate("carol", &"hunter22".into()).await.is_err());
        assert!(json_authenticator.authenticate("carol", &"".into()).await.is_err());
    }

    #[test]
    fn test_plain_compare() {
        assert!(plain_matches("hunter2", "hunter2"));
        assert!(!plain_matches("hunter2", "Hunter2"));
        assert!(!plain_matches("hunter2", "hunter2 "));
        assert!(plain_matches("", ""));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_unknown_user() {
        let json_authenticator = JsonFileAuthenticator::from_json(PBKDF2_USERS).unwrap();
        assert!(matches!(
            json_authenticator.authenticate("mallory", &"whatever".into()).await,
            Err(AuthenticationError::BadUser)
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_permissions_are_enforced() {
        let json_authenticator = JsonFileAuthenticator::from_json(PBKDF2_USERS).unwrap();
        let bella = json_authenticator.authenticate("bella", &"also not secret".into()).await.unwrap();
        let path = Path::new("/bella/file.txt");
        assert!(json_authenticator.permit(&bella, path, Operation::Read).await);
        assert!(json_authenticator.permit(&bella, path, Operation::List).await);
        assert!(!json_authenticator.permit(&bella, path, Operation::Write).await);
        assert!(!json_authenticator.permit(&bella, path, Operation::Delete).await);
        assert!(!json_authenticator.permit(&bella, path, Operation::Rename).await);
    }

    #[test]
    fn test_salts_have_to_be_unique() {
        let json: &str = r#"[
  {
    "username": "alice",
    "pbkdf2_salt": "salt",
    "pbkdf2_key": "Egbi+LYfwn00V+HwFq146kmhoE4TYaqPFCA7mKkfzEpSZe2zMqXz/8LfA7HjYvXgiLzOuDij2wf50eKcWOcjYQ==",
    "pbkdf2_iter": 5000
  },
  {
    "username": "bella",
    "pbkdf2_salt": "salt",
    "pbkdf2_key": "9QSFDFRU80n1Jktu6s3Wo0XEArW3eQdw9zt4L9OBJjsGOYAsHfWqR4RKGwzve0Dih2M3Az+HHvKC9f43wYRRng==",
    "pbkdf2_iter": 5000
  }
]"#;
        assert!(JsonFileAuthenticator::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_incomplete_entries() {
        assert!(JsonFileAuthenticator::from_json(r#"[{"username": "dave"}]"#).is_err());
        assert!(JsonFileAuthenticator::from_json(r#"[{"username": "dave", "password": "x", "pbkdf2_iter": 5}]"#).is_err());
        assert!(JsonFileAuthenticator::from_json(r#"[{"username": "dave", "password": "x", "permissions": ["fly"]}]"#).is_err());
    }

    #[test]
    fn test_rejects_short_key() {
        let json = r#"[{"username": "erin", "pbkdf2_salt": "s", "pbkdf2_key": "c2hvcnQ=", "pbkdf2_iter": 5000}]"#;
        assert!(JsonFileAuthenticator::from_json(json).is_err());
    }

    #[test]
    fn test_duplicate_users_are_rejected() {
        let json = r#"[{"username": "x", "password": "a"}, {"username": "x", "password": "b"}]"#;
        assert!(JsonFileAuthenticator::from_json(json).is_err());
    }
}
