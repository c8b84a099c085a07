//! Contains the [`Server`](crate::Server) and everything it runs: the control loop of each
//! session, the data connections and the command handlers.

pub(crate) mod controlchan;
pub(crate) mod datachan;
pub(crate) mod ftpserver;
mod io;
mod password;
mod session;
mod shutdown;
mod switchboard;
