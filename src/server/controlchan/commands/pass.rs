//! The RFC 959 Password (`PASS`) command
//
// The argument field is a Telnet string specifying the user's
// password.  This command must be immediately preceded by the
// user name command, and, for some sites, completes the user's
// identification for access control.  Since password
// information is quite sensitive, it is desirable in general
// to "mask" it or suppress typeout.  It appears that the
// server has no foolproof way to achieve this.  It is
// therefore the responsibility of the user-FTP process to hide
// the sensitive password information.

use crate::{
    auth::{AuthenticationError, Credentials, UserDetail},
    metrics,
    server::{
        controlchan::{
            Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        password::Password,
        session::SessionState,
    },
    storage::Driver,
};
use async_trait::async_trait;
use std::{path::PathBuf, sync::Arc};

#[derive(Debug)]
pub struct Pass;

#[async_trait]
impl<D, U> CommandHandler<D, U> for Pass
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument(skip(args))]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        let username = match (args.session.state, &args.session.username) {
            (SessionState::AwaitingPassword, Some(username)) => username.clone(),
            _ => return Ok(Reply::new(ReplyCode::BadCommandSequence, "Please give me a username first")),
        };
        let password = Password::from(args.arg);
        let creds = Credentials {
            password: Some(password.into_inner()),
            source_ip: args.peer_addr.ip(),
        };

        let user = match args.config.authenticator.authenticate(&username, &creds).await {
            Ok(user) => user,
            Err(err) => {
                match &err {
                    AuthenticationError::ImplPropagated(_, _) => {
                        slog::warn!(args.logger, "Authentication back-end failed: {}", err; "username" => &username)
                    }
                    _ => slog::info!(args.logger, "Login failed: {}", err; "username" => &username),
                }
                if args.config.collect_metrics {
                    metrics::inc_failed_login();
                }
                args.session.state = SessionState::Connected;
                args.session.username = None;
                return Ok(Reply::new(ReplyCode::NotLoggedIn, "Authentication failed"));
            }
        };

        if !user.account_enabled() {
            slog::info!(args.logger, "Login refused, account disabled"; "username" => &username);
            if args.config.collect_metrics {
                metrics::inc_failed_login();
            }
            args.session.state = SessionState::Connected;
            args.session.username = None;
            return Ok(Reply::new(ReplyCode::NotLoggedIn, "Account disabled"));
        }

        let mut driver = (args.config.driver_factory)();
        if let Err(err) = driver.enter(&user) {
            slog::warn!(args.logger, "Could not enter the home directory: {}", err; "username" => &username);
            args.session.state = SessionState::Connected;
            args.session.username = None;
            return Ok(Reply::new(ReplyCode::NotLoggedIn, "Home directory not available"));
        }

        slog::info!(args.logger, "User logged in"; "username" => &username, "user" => user.to_string());
        args.session.driver = Some(Arc::new(driver));
        args.session.user = Some(Arc::new(user));
        args.session.cwd = PathBuf::from("/");
        args.session.state = SessionState::Authenticated;
        Ok(Reply::new(ReplyCode::UserLoggedIn, "User logged in, proceed"))
    }
}
