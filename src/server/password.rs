use std::fmt;

/// The argument of a `PASS` command. Its `Display` and `Debug` forms never reveal the secret so it
/// can be logged safely.
#[derive(PartialEq, Eq, Clone)]
pub(crate) struct Password {
    secret: String,
}

impl Password {
    pub fn new(secret: impl Into<String>) -> Self {
        Password { secret: secret.into() }
    }

    pub fn into_inner(self) -> String {
        self.secret
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*******")
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password {{ secret: ******* }}")
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Password {
    fn as_ref(&self) -> &str {
        &self.secret
    }
}
