//! Contains shared code for the PASV and EPSV commands.

use crate::{
    auth::UserDetail,
    server::{controlchan::handler::CommandContext, switchboard::PortLease},
    storage::Driver,
};
use std::{
    io,
    net::{IpAddr, SocketAddr},
};
use tokio::net::{TcpListener, TcpSocket};

const BIND_RETRIES: u8 = 10;

/// Leases a port from the pool and listens on it on the local address of the control connection.
/// A leased port that turns out to be taken by another process goes back to the pool and the
/// next one is tried.
#[tracing_attributes::instrument]
pub(super) fn listen_passive<D, U>(args: &CommandContext<'_, D, U>) -> io::Result<(TcpListener, PortLease)>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    let ip = args.local_addr.ip();
    let mut last_error = io::Error::new(io::ErrorKind::InvalidInput, "Bind retries cannot be 0");

    for _ in 0..BIND_RETRIES {
        let lease = args
            .config
            .switchboard
            .reserve(args.session.trace_id)
            .map_err(|e| io::Error::new(io::ErrorKind::AddrNotAvailable, format!("no passive port available: {:?}", e)))?;
        let socket = match ip {
            IpAddr::V4(_) => TcpSocket::new_v4()?,
            IpAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.set_reuseaddr(true)?;
        match socket.bind(SocketAddr::new(ip, lease.port())) {
            Ok(()) => return Ok((socket.listen(1)?, lease)),
            Err(e) => {
                slog::debug!(args.logger, "Could not bind passive port {}: {}", lease.port(), e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}
