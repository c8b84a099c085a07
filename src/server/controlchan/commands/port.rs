//! The RFC 959 Data Port (`PORT`) command
//
// The argument is the HOST-PORT of the data port
// to be used in data connection.  There are defaults for both
// the user and server data ports, and under normal
// circumstances this command and its reply are not needed.  If
// this command is used, the argument is the concatenation of a
// 32-bit internet host address and a 16-bit TCP port address.
// This address information is broken into 8-bit fields and the
// value of each field is transmitted as a decimal number (in
// character string representation).  The fields are separated
// by commas.  A port command would be:
//
// PORT h1,h2,h3,h4,p1,p2
//
// where h1 is the high order 8 bits of the internet host
// address.

use super::transfer_common::{after_reset, reset_data_connection};
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
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug)]
pub struct Port;

/// Parses the `h1,h2,h3,h4,p1,p2` argument of `PORT`.
fn parse_host_port(arg: &str) -> Option<SocketAddr> {
    let fields = arg
        .trim()
        .split(',')
        .map(|field| field.trim().parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .ok()?;
    let [h1, h2, h3, h4, p1, p2] = <[u8; 6]>::try_from(fields.as_slice()).ok()?;
    let addr = SocketAddr::new(Ipv4Addr::new(h1, h2, h3, h4).into(), u16::from_be_bytes([p1, p2]));
    acceptable_target(&addr).then_some(addr)
}

/// Whether the server may connect out to `addr` for an active mode data connection.
pub(super) fn acceptable_target(addr: &SocketAddr) -> bool {
    let ip = addr.ip();
    let broadcast = matches!(ip, IpAddr::V4(v4) if v4.is_broadcast());
    addr.port() != 0 && !ip.is_unspecified() && !ip.is_multicast() && !broadcast
}

#[async_trait]
impl<D, U> CommandHandler<D, U> for Port
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        let Some(addr) = parse_host_port(args.arg) else {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Invalid PORT argument"));
        };
        let aborted = reset_data_connection(args.session).await;
        args.session.data = Some(DataConnection::Active { addr });
        slog::debug!(args.logger, "Active data connection requested"; "addr" => %addr);
        Ok(after_reset(aborted, Reply::new(ReplyCode::CommandOkay, "PORT command successful")))
    }
}
