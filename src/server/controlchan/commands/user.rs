//! The RFC 959 User Name (`USER`) command
//
// The argument field is a Telnet string identifying the user.
// The user identification is that which is required by the
// server for access to its file system.  This command will
// normally be the first command transmitted by the user after
// the control connections are made.  Servers may allow a new
// USER command to be entered at any point in order to change
// the access control and/or accounting information.  This has
// the effect of flushing any user, password, and account
// information already supplied and beginning the login
// sequence again.

use super::transfer_common::after_reset;
use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        session::SessionState,
    },
    storage::Driver,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct User;

#[async_trait]
impl<D, U> CommandHandler<D, U> for User
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        // A running transfer still gets its closing reply, before the one for USER.
        let aborted = args.session.abort_transfer().await;
        args.session.reset_login();
        if args.arg.is_empty() {
            return Ok(after_reset(aborted, Reply::new(ReplyCode::ParameterSyntaxError, "Invalid username")));
        }
        slog::debug!(args.logger, "USER received"; "username" => args.arg);
        args.session.username = Some(args.arg.to_string());
        args.session.state = SessionState::AwaitingPassword;
        Ok(after_reset(aborted, Reply::new(ReplyCode::NeedPassword, "Password Required")))
    }
}
