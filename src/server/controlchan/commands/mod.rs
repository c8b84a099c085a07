//! This module contains the implementations for the FTP commands defined in
//!
//! - [RFC 959 - FTP](https://tools.ietf.org/html/rfc959)
//! - [RFC 2389 - Feature negotiation mechanism for FTP](https://tools.ietf.org/html/rfc2389)
//! - [RFC 2428 - FTP Extensions for IPv6 and NATs](https://tools.ietf.org/html/rfc2428)
//! - [RFC 3659 - Extensions to FTP](https://tools.ietf.org/html/rfc3659)

mod abor;
mod allo;
mod appe;
mod cdup;
mod cwd;
mod dele;
mod eprt;
mod epsv;
mod feat;
mod help;
mod list;
mod mdtm;
mod mkd;
mod mode;
mod nlst;
mod noop;
mod opts;
mod pass;
mod passive_common;
mod pasv;
mod port;
mod pwd;
mod quit;
mod rest;
mod retr;
mod rmd;
mod rnfr;
mod rnto;
mod size;
mod stat;
mod stor;
mod stru;
mod syst;
mod transfer_common;
mod type_;
mod unsupported;
mod user;

pub(crate) use abor::Abor;
pub(crate) use allo::Allo;
pub(crate) use appe::Appe;
pub(crate) use cdup::Cdup;
pub(crate) use cwd::Cwd;
pub(crate) use dele::Dele;
pub(crate) use eprt::Eprt;
pub(crate) use epsv::Epsv;
pub(crate) use feat::Feat;
pub(crate) use help::Help;
pub(crate) use list::List;
pub(crate) use mdtm::Mdtm;
pub(crate) use mkd::Mkd;
pub(crate) use mode::Mode;
pub(crate) use nlst::Nlst;
pub(crate) use noop::Noop;
pub(crate) use opts::Opts;
pub(crate) use pass::Pass;
pub(crate) use pasv::Pasv;
pub(crate) use port::Port;
pub(crate) use pwd::Pwd;
pub(crate) use quit::Quit;
pub(crate) use rest::Rest;
pub(crate) use retr::Retr;
pub(crate) use rmd::Rmd;
pub(crate) use rnfr::Rnfr;
pub(crate) use rnto::Rnto;
pub(crate) use size::Size;
pub(crate) use stat::Stat;
pub(crate) use stor::Stor;
pub(crate) use stru::Stru;
pub(crate) use syst::Syst;
pub(crate) use type_::Type;
pub(crate) use unsupported::Unsupported;
pub(crate) use user::User;

use super::{Reply, ReplyCode};

/// The reply for an operation the `Authorizer` refused.
pub(crate) fn permission_denied() -> Reply {
    Reply::new(ReplyCode::FileError, "Permission denied")
}
