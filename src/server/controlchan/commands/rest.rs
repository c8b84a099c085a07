//! Restart of Interrupted Transfer (REST)
//! To avoid having to resend the entire file if the file is only
//! partially transferred, both sides need some way to agree on where in
//! the data stream to restart the data transfer.
//!
//! See also: <https://cr.yp.to/ftp/retr.html>
//!

use crate::{
    auth::UserDetail,
    server::controlchan::{
        Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::Driver,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Rest;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Rest
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        match args.arg.trim().parse::<u64>() {
            Ok(offset) => {
                args.session.start_pos = offset;
                Ok(Reply::new_with_string(
                    ReplyCode::FileActionPending,
                    format!("Restarting at {}. Now send STORE or RETRIEVE.", offset),
                ))
            }
            Err(_) => Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Invalid restart offset")),
        }
    }
}
