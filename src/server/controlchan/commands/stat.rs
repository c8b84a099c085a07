//! The RFC 959 Status (`STAT`) command
//
// This command shall cause a status response to be sent over
// the control connection in the form of a reply.  The command
// may be sent during a file transfer (along with the Telnet IP
// and Synch signals--see the Section on FTP Commands) in which
// case the server will respond with the status of the
// operation in progress, or it may be sent between file
// transfers.  In the latter case, the command may have an
// argument field.  If the argument is a pathname, the command
// is analogous to the "list" command except that data shall be
// transferred over the control connection.  If a partial
// pathname is given, the server may respond with a list of
// file names or attributes matching that path.
// If no argument is given, the server should return general
// status information about the server FTP process.  This
// should include current values of all transfer parameters and
// the status of connections.

use super::permission_denied;
use crate::{
    auth::{Operation, UserDetail},
    server::{
        controlchan::{
            Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        datachan::DataConnection,
        session::{SessionState, TransferType},
    },
    storage::Driver,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Stat;

impl Stat {
    fn session_status<D, U>(args: &CommandContext<'_, D, U>) -> Reply
    where
        D: Driver<U> + 'static,
        U: UserDetail + 'static,
    {
        let session = &args.session;
        let login = match (session.state, &session.username) {
            (SessionState::Authenticated, Some(name)) => format!(" Logged in as {}", name),
            _ => String::from(" Not logged in"),
        };
        let transfer_type = match session.transfer_type {
            TransferType::Ascii => "ASCII",
            TransferType::Binary => "BINARY",
        };
        let data = match (&session.transfer, &session.data) {
            (Some(_), _) => String::from(" Data connection: transfer in progress"),
            (None, Some(DataConnection::Active { addr })) => format!(" Data connection: active to {}", addr),
            (None, Some(DataConnection::Passive { lease, .. })) => format!(" Data connection: passive on port {}", lease.port()),
            (None, None) => String::from(" Data connection: none"),
        };
        let lines = vec![
            format!("Status of session {}:", session.trace_id),
            format!(" Connected from {}", args.peer_addr),
            login,
            format!(" TYPE: {}, STRUcture: File, MODE: Stream", transfer_type),
            format!(" Working directory: {}", session.cwd.display()),
            data,
            String::from("End of status"),
        ];
        Reply::new_multiline(ReplyCode::SystemStatus, lines)
    }
}

#[async_trait]
impl<D, U> CommandHandler<D, U> for Stat
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext<'_, D, U>) -> Result<Reply, ControlChanError> {
        if args.arg.is_empty() {
            return Ok(Stat::session_status(&args));
        }

        // With a path argument this is LIST over the control connection.
        let (driver, user) = args.login()?;
        let path = args.session.resolve(args.arg);
        if !args.config.authorizer.permit(&user, &path, Operation::List).await {
            return Ok(permission_denied());
        }
        let listing = driver.list_fmt(&user, &path).await?;
        let listing = String::from_utf8_lossy(&listing);
        let mut lines = vec![format!("Status of {}:", path.display())];
        lines.extend(listing.lines().map(String::from));
        lines.push(String::from("End of status"));
        Ok(Reply::new_multiline(ReplyCode::FileStatus, lines))
    }
}
