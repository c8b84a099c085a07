//! Contains code pertaining to the setup options that can be given to the [`ServerBuilder`](crate::ServerBuilder)

use std::{net::Ipv4Addr, ops::RangeInclusive, time::Duration};

/// The greeting sent to a client when it connects.
pub const DEFAULT_GREETING: &str = "Welcome to the libftpengine FTP server";
/// The range the passive (`PASV`/`EPSV`) data ports are taken from.
pub const DEFAULT_PASSIVE_PORTS: RangeInclusive<u16> = 49152..=65535;
/// How long a session may go without sending a command while no transfer runs.
pub const DEFAULT_IDLE_SESSION_TIMEOUT: Duration = Duration::from_secs(600);
/// The number of control connections served at the same time.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;
/// How long a transfer waits for its data connection to be established.
pub const DEFAULT_DATA_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// How long a shutdown waits for sessions to finish before aborting them.
pub const DEFAULT_SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);
/// The longest command line accepted, terminator included.
pub const DEFAULT_MAX_COMMAND_LENGTH: usize = 4096;

/// The option to [`ServerBuilder::passive_host`](crate::ServerBuilder::passive_host). It allows the
/// user to specify how the IP address communicated in the _PASV_ response is determined.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum PassiveHost {
    /// Use the IP address of the control connection
    #[default]
    FromConnection,
    /// Advertise this specific IP address, e.g. the public address of a NAT gateway.
    Ip(Ipv4Addr),
}

impl From<Ipv4Addr> for PassiveHost {
    fn from(ip: Ipv4Addr) -> Self {
        PassiveHost::Ip(ip)
    }
}

impl From<[u8; 4]> for PassiveHost {
    fn from(ip: [u8; 4]) -> Self {
        PassiveHost::Ip(ip.into())
    }
}
