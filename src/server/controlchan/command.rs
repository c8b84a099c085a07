//! Contains the [`Command`] type that the control channel codec produces for every line it reads.

use crate::server::password::Password;
use std::fmt;

/// A single command line sent by the client: an uppercased verb and the (possibly empty) argument
/// that followed it.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Command {
    pub verb: String,
    pub arg: String,
}

impl Command {
    pub fn new(verb: impl Into<String>, arg: impl Into<String>) -> Self {
        Command {
            verb: verb.into(),
            arg: arg.into(),
        }
    }

    fn is_secret(&self) -> bool {
        self.verb == "PASS"
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arg.is_empty() {
            write!(f, "{}", self.verb)
        } else if self.is_secret() {
            write!(f, "{} {}", self.verb, Password::from(self.arg.as_str()))
        } else {
            write!(f, "{} {}", self.verb, self.arg)
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_secret() {
            f.debug_struct("Command")
                .field("verb", &self.verb)
                .field("arg", &Password::from(self.arg.as_str()))
                .finish()
        } else {
            f.debug_struct("Command").field("verb", &self.verb).field("arg", &self.arg).finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_hides_password() {
        assert_eq!(Command::new("PASS", "hunter2").to_string(), "PASS *******");
        assert!(!format!("{:?}", Command::new("PASS", "hunter2")).contains("hunter2"));
    }

    #[test]
    fn display_shows_other_arguments() {
        assert_eq!(Command::new("RETR", "a file.txt").to_string(), "RETR a file.txt");
        assert_eq!(Command::new("PWD", "").to_string(), "PWD");
    }
}
