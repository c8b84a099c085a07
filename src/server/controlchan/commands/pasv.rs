//! The RFC 959 Passive (`PASV`) command
//
// This command requests the server-DTP to "listen" on a data
// port (which is not its default data port) and to wait for a
// connection rather than initiate one upon receipt of a
// transfer command.  The response to this command includes the
// host and port address this server is listening on.

use super::{
    passive_common::listen_passive,
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
        ftpserver::options::PassiveHost,
    },
    storage::Driver,
};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};

#[derive(Debug)]
pub struct Pasv;

fn passive_mode_reply(ip: Ipv4Addr, port: u16) -> Reply {
    let [h1, h2, h3, h4] = ip.octets();
    let [p1, p2] = port.to_be_bytes();
    Reply::new_with_string(
        ReplyCode::EnteringPassiveMode,
        format!("Entering Passive Mode ({},{},{},{},{},{})", h1, h2, h3, h4, p1, p2),
    )
}

#[async_trait]
impl<D, U> CommandHandler<D, U> for Pasv
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        let advertised = match (args.config.passive_host, args.local_addr.ip()) {
            (PassiveHost::Ip(ip), _) => ip,
            (PassiveHost::FromConnection, IpAddr::V4(ip)) => ip,
            (PassiveHost::FromConnection, IpAddr::V6(ip)) => match ip.to_ipv4_mapped() {
                Some(ip) => ip,
                None => return Ok(Reply::new(ReplyCode::CantOpenDataConnection, "PASV needs IPv4, use EPSV instead")),
            },
        };

        let aborted = reset_data_connection(args.session).await;
        let (listener, lease) = match listen_passive(&args) {
            Ok(bound) => bound,
            Err(e) => {
                slog::warn!(args.logger, "Could not allocate a passive port: {}", e);
                return Ok(after_reset(
                    aborted,
                    Reply::new(ReplyCode::CantOpenDataConnection, "No data connection established"),
                ));
            }
        };
        let reply = passive_mode_reply(advertised, lease.port());
        args.session.data = Some(DataConnection::Passive { listener, lease });
        Ok(after_reset(aborted, reply))
    }
}
