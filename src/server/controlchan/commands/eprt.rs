//! The RFC 2428 Extended Port (`EPRT`) command
//
// The EPRT command lets the client give an extended address
// for the data connection.  The extended address MUST consist of the
// network protocol as well as the network and transport addresses.  The
// format of EPRT is:
//
//     EPRT<space><d><net-prt><d><net-addr><d><tcp-port><d>
//
// The network protocol is 1 for IPv4 and 2 for IPv6. The delimiter <d>
// is a character in the ASCII range 33-126, normally '|'.

use super::{
    port::acceptable_target,
    transfer_common::{after_reset, reset_data_connection},
};
use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        datachan::DataConnection,
    },
    storage::Driver,
};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

#[derive(Debug)]
pub struct Eprt;

#[derive(Debug, PartialEq, Eq)]
enum EprtError {
    Syntax,
    UnsupportedProtocol,
}

fn parse_extended_address(arg: &str) -> Result<SocketAddr, EprtError> {
    let arg = arg.trim();
    let delimiter = arg.chars().next().filter(|c| ('!'..='~').contains(c)).ok_or(EprtError::Syntax)?;
    let fields: Vec<&str> = arg.split(delimiter).collect();
    let ["", proto, addr, port, ""] = fields.as_slice() else {
        return Err(EprtError::Syntax);
    };
    let ip: IpAddr = match *proto {
        "1" => addr.parse::<Ipv4Addr>().map_err(|_| EprtError::Syntax)?.into(),
        "2" => addr.parse::<Ipv6Addr>().map_err(|_| EprtError::Syntax)?.into(),
        _ => return Err(EprtError::UnsupportedProtocol),
    };
    let port = port.parse::<u16>().map_err(|_| EprtError::Syntax)?;
    let addr = SocketAddr::new(ip, port);
    if acceptable_target(&addr) { Ok(addr) } else { Err(EprtError::Syntax) }
}

#[async_trait]
impl<D, U> CommandHandler<D, U> for Eprt
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        let addr = match parse_extended_address(args.arg) {
            Ok(addr) => addr,
            Err(EprtError::UnsupportedProtocol) => {
                return Ok(Reply::new(ReplyCode::NetworkProtocolNotSupported, "Network protocol not supported, use (1,2)"));
            }
            Err(EprtError::Syntax) => return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Invalid EPRT argument")),
        };
        let aborted = reset_data_connection(args.session).await;
        args.session.data = Some(DataConnection::Active { addr });
        slog::debug!(args.logger, "Active data connection requested"; "addr" => %addr);
        Ok(after_reset(aborted, Reply::new(ReplyCode::CommandOkay, "EPRT command successful")))
    }
}
