//! This modules implements a line parser for FTP control channel commands
//!
//! Use the parse method. It takes a FTP line and returns a [`Command`] holding the verb and its
//! argument. What the argument means is up to the handler registered for the verb.
//!
//! [`Command`]: super::command::Command
pub mod error;
mod parser;
#[cfg(test)]
mod tests;

pub use parser::parse;
