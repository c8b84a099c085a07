//! The RFC 2428 Passive (`EPSV`) command
//
// The EPSV command requests that a server listen on a data port and
// wait for a connection. The EPSV command takes an optional argument.
// The response to this command includes only the TCP port number of the
// listening connection.

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
    },
    storage::Driver,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Epsv;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Epsv
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        match args.arg.trim() {
            "" | "1" | "2" => {}
            all if all.eq_ignore_ascii_case("ALL") => {
                // Only EPSV is used from here on, which is what we do anyway.
                return Ok(Reply::new(ReplyCode::CommandOkay, "EPSV ALL command successful"));
            }
            proto if proto.parse::<u8>().is_ok() => {
                return Ok(Reply::new(ReplyCode::NetworkProtocolNotSupported, "Network protocol not supported, use (1,2)"));
            }
            _ => return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Invalid EPSV argument")),
        }

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
        let reply = Reply::new_with_string(
            ReplyCode::EnteringExtendedPassiveMode,
            format!("Entering Extended Passive Mode (|||{}|)", lease.port()),
        );
        args.session.data = Some(DataConnection::Passive { listener, lease });
        Ok(after_reset(aborted, reply))
    }
}
