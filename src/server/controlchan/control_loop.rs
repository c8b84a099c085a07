//! The control loop of a single session: it reads command lines, dispatches them and writes the
//! replies back, while keeping an eye on the session's transfer, the idle timer and the server's
//! shutdown signal.

use crate::{
    auth::{Authenticator, Authorizer, UserDetail},
    metrics,
    server::{
        controlchan::{
            Reply, ReplyCode,
            codecs::FtpCodec,
            command::Command,
            dispatch::DispatchTable,
            error::{ControlChanError, ControlChanErrorKind},
            handler::CommandContext,
            line_parser::error::{ParseError, ParseErrorKind},
        },
        datachan::{TransferOutcome, wait_transfer},
        ftpserver::options::PassiveHost,
        session::{Drain, Session, SessionState},
        shutdown,
        switchboard::Switchboard,
    },
    storage::{self, Driver},
};
use futures_util::{SinkExt, StreamExt};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

/// Everything a session needs from the server. Built once by the `ServerBuilder` and shared by
/// all sessions.
pub(crate) struct Config<D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    pub driver_factory: Box<dyn Fn() -> D + Send + Sync>,
    pub authenticator: Arc<dyn Authenticator<U>>,
    pub authorizer: Arc<dyn Authorizer<U>>,
    pub dispatch: DispatchTable<D, U>,
    pub greeting: String,
    pub passive_host: PassiveHost,
    pub switchboard: Arc<Switchboard>,
    pub idle_session_timeout: Duration,
    pub data_connect_timeout: Duration,
    pub max_command_length: usize,
    pub collect_metrics: bool,
}

type ControlChannel = Framed<TcpStream, FtpCodec>;

enum Event {
    Line(Option<Result<Result<Command, ParseError>, ControlChanError>>),
    TransferDone(TransferOutcome),
    Shutdown,
    IdleTimeout,
}

/// Serves one control connection until the client leaves, the session times out or the server
/// shuts down. Only I/O errors on the control connection itself end up in the returned error.
#[tracing_attributes::instrument(skip(config, tcp_stream, shutdown, logger))]
pub(crate) async fn serve<D, U>(
    config: Arc<Config<D, U>>,
    tcp_stream: TcpStream,
    mut shutdown: shutdown::ShutdownWatch,
    logger: slog::Logger,
) -> Result<(), ControlChanError>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    let local_addr = tcp_stream.local_addr()?;
    let peer_addr = tcp_stream.peer_addr()?;
    let mut session: Session<D, U> = Session::new();
    let logger = logger.new(slog::o!("trace-id" => session.trace_id.to_string(), "source" => peer_addr.to_string()));
    if config.collect_metrics {
        metrics::inc_session();
    }

    let mut channel = Framed::new(tcp_stream, FtpCodec::new(config.max_command_length));
    slog::info!(logger, "Starting control loop");
    respond(&mut channel, Reply::new(ReplyCode::ServiceReady, &config.greeting), &config, &logger).await?;

    let result = control_loop(&config, &mut channel, &mut session, &mut shutdown, local_addr, peer_addr, &logger).await;
    match &result {
        Ok(()) => slog::info!(logger, "Control loop ended"),
        Err(e) => {
            if config.collect_metrics {
                metrics::add_error_metric(e.kind());
            }
            slog::warn!(logger, "Control loop ended with an error: {:?}", e)
        }
    }
    // Dropping the session cancels a transfer that may still be running.
    result
}

#[allow(clippy::too_many_arguments)]
async fn control_loop<D, U>(
    config: &Config<D, U>,
    channel: &mut ControlChannel,
    session: &mut Session<D, U>,
    shutdown: &mut shutdown::ShutdownWatch,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
    logger: &slog::Logger,
) -> Result<(), ControlChanError>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    loop {
        let draining = session.draining.is_some();
        let transferring = session.transfer.is_some();
        let event = tokio::select! {
            line = channel.next(), if !draining => Event::Line(line),
            outcome = wait_transfer(&mut session.transfer) => Event::TransferDone(outcome),
            _ = shutdown.requested(), if !draining => Event::Shutdown,
            _ = tokio::time::sleep(config.idle_session_timeout), if !transferring => Event::IdleTimeout,
        };

        match event {
            Event::Line(None) => {
                slog::info!(logger, "Client closed the control connection");
                return Ok(());
            }
            Event::Line(Some(Err(e))) => return Err(e),
            Event::Line(Some(Ok(Err(parse_error)))) => {
                slog::info!(logger, "Could not parse command: {}", parse_error);
                respond(channel, parse_error_reply(&parse_error), config, logger).await?;
            }
            Event::Line(Some(Ok(Ok(command)))) => {
                let reply = handle_command(command, config, session, local_addr, peer_addr, logger).await;
                respond(channel, reply, config, logger).await?;
                // Only QUIT drains, and without a transfer it has said goodbye already.
                if session.draining.is_some() && session.transfer.is_none() {
                    return Ok(());
                }
            }
            Event::TransferDone(outcome) => {
                session.transfer = None;
                if config.collect_metrics {
                    metrics::add_transfer_metric(&outcome);
                }
                respond(channel, outcome.reply(), config, logger).await?;
                match session.draining {
                    Some(Drain::Quit) => {
                        respond(channel, Reply::new(ReplyCode::ClosingControlConnection, "Bye!"), config, logger).await?;
                        return Ok(());
                    }
                    Some(Drain::Shutdown) => {
                        respond(channel, shutting_down(), config, logger).await?;
                        return Ok(());
                    }
                    None => {}
                }
            }
            Event::Shutdown => {
                if session.transfer.is_some() {
                    slog::info!(logger, "Shutdown requested, letting the transfer finish first");
                    session.draining = Some(Drain::Shutdown);
                } else {
                    slog::info!(logger, "Shutdown requested, closing the session");
                    respond(channel, shutting_down(), config, logger).await?;
                    return Ok(());
                }
            }
            Event::IdleTimeout => {
                slog::info!(logger, "Control connection timed out");
                respond(
                    channel,
                    Reply::new(ReplyCode::ServiceNotAvailable, "Session timed out. Closing control connection"),
                    config,
                    logger,
                )
                .await?;
                return Ok(());
            }
        }
    }
}

#[tracing_attributes::instrument(skip(config, session, logger))]
async fn handle_command<D, U>(
    command: Command,
    config: &Config<D, U>,
    session: &mut Session<D, U>,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
    logger: &slog::Logger,
) -> Reply
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    slog::info!(logger, "Processing command"; "cmd" => %command);
    if config.collect_metrics {
        metrics::add_command_metric(&command.verb);
    }
    // A pending rename only survives until the very next command.
    if command.verb != "RNTO" {
        session.rename_from = None;
    }

    let entry = config.dispatch.lookup(&command.verb);
    if entry.requires_auth && session.state != SessionState::Authenticated {
        return Reply::new(ReplyCode::NotLoggedIn, "Please authenticate");
    }

    let args = CommandContext {
        arg: &command.arg,
        session,
        config,
        local_addr,
        peer_addr,
        logger,
    };
    match entry.handler.handle(args).await {
        Ok(reply) => reply,
        Err(err) => {
            if config.collect_metrics {
                metrics::add_error_metric(err.kind());
            }
            match err.kind() {
                ControlChanErrorKind::StorageError(kind) => {
                    slog::info!(logger, "Storage error: {:?}", err; "verb" => &command.verb);
                    storage_error_reply(kind)
                }
                _ => {
                    slog::warn!(logger, "Command failed: {:?}", err; "verb" => &command.verb);
                    Reply::new(ReplyCode::LocalError, "Unknown internal server error, please try again later")
                }
            }
        }
    }
}

/// Sends a reply, unless it is empty.
async fn respond<D, U>(channel: &mut ControlChannel, reply: Reply, config: &Config<D, U>, logger: &slog::Logger) -> Result<(), ControlChanError>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    if reply == Reply::None {
        return Ok(());
    }
    if config.collect_metrics {
        metrics::add_reply_metric(&reply);
    }
    slog::debug!(logger, "Sending reply"; "codes" => ?reply.codes());
    channel.send(reply).await
}

fn shutting_down() -> Reply {
    Reply::new(ReplyCode::ServiceNotAvailable, "Server is shutting down")
}

fn parse_error_reply(error: &ParseError) -> Reply {
    match error.kind() {
        ParseErrorKind::LineTooLong => Reply::new(ReplyCode::CommandSyntaxError, "Command line too long"),
        ParseErrorKind::InvalidUtf8 => Reply::new(ReplyCode::CommandSyntaxError, "Invalid UTF8 in command"),
        ParseErrorKind::InvalidCommand | ParseErrorKind::InvalidEol => Reply::new(ReplyCode::CommandSyntaxError, "Syntax error, command unrecognized"),
    }
}

/// The display form of a storage error kind starts with the reply code to answer with.
fn storage_error_reply(kind: storage::ErrorKind) -> Reply {
    let text = kind.to_string();
    let (code, msg) = text.split_once(' ').unwrap_or(("451", text.as_str()));
    let code = code.parse().ok().and_then(ReplyCode::from_u32).unwrap_or(ReplyCode::LocalError);
    Reply::new(code, msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn storage_errors_keep_their_code() {
        assert_eq!(storage_error_reply(storage::ErrorKind::NotFound), Reply::new(ReplyCode::FileError, "File not found"));
        assert_eq!(
            storage_error_reply(storage::ErrorKind::InsufficientStorageSpace),
            Reply::new(ReplyCode::OutOfSpace, "Insufficient storage space")
        );
        assert_eq!(
            storage_error_reply(storage::ErrorKind::FileNameNotAllowed),
            Reply::new(ReplyCode::BadFileName, "File name not allowed")
        );
        assert_eq!(storage_error_reply(storage::ErrorKind::LocalError), Reply::new(ReplyCode::LocalError, "Local error"));
    }

    #[test]
    fn parse_errors_are_500() {
        for kind in [
            ParseErrorKind::InvalidCommand,
            ParseErrorKind::InvalidEol,
            ParseErrorKind::InvalidUtf8,
            ParseErrorKind::LineTooLong,
        ] {
            assert_eq!(parse_error_reply(&ParseError::from(kind)).codes(), vec![ReplyCode::CommandSyntaxError]);
        }
    }
}
