use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            Reply,
            control_loop::Config,
            error::{ControlChanError, ControlChanErrorKind},
        },
        session::Session,
    },
    storage::Driver,
};
use async_trait::async_trait;
use std::{fmt, net::SocketAddr, result::Result, sync::Arc};

#[async_trait]
pub(crate) trait CommandHandler<D, U>: Send + Sync + std::fmt::Debug
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError>;
}

/// Convenience struct to group command args
pub(crate) struct CommandContext<'a, D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    pub arg: &'a str,
    pub session: &'a mut Session<D, U>,
    pub config: &'a Config<D, U>,
    pub local_addr: SocketAddr,
    pub peer_addr: SocketAddr,
    pub logger: &'a slog::Logger,
}

impl<D, U> CommandContext<'_, D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    /// The driver and user of a logged in session.
    pub fn login(&self) -> Result<(Arc<D>, Arc<U>), ControlChanError> {
        match (&self.session.driver, &self.session.user) {
            (Some(driver), Some(user)) => Ok((Arc::clone(driver), Arc::clone(user))),
            _ => Err(ControlChanErrorKind::IllegalState.into()),
        }
    }
}

impl<D, U> fmt::Debug for CommandContext<'_, D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("arg", &self.arg)
            .field("trace_id", &self.session.trace_id)
            .field("peer_addr", &self.peer_addr)
            .finish()
    }
}
