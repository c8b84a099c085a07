//! Contains code pertaining to the FTP *control* channel

pub(crate) mod codecs;
pub(crate) mod command;
pub(crate) mod commands;
pub(crate) mod control_loop;
pub(crate) mod dispatch;
pub(crate) mod error;
pub(crate) mod handler;
pub(crate) mod line_parser;

mod reply;
pub(crate) use reply::{Reply, ReplyCode};

#[cfg(test)]
pub(crate) mod testing;
