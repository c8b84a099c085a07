//! Contains the code that accepts control connections and supervises the sessions spawned for them.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            Reply, ReplyCode,
            codecs::FtpCodec,
            control_loop::{self, Config},
        },
        shutdown,
    },
    storage::Driver,
};
use futures_util::SinkExt;
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{
    net::{TcpListener, TcpStream},
    task::JoinSet,
};
use tokio_util::codec::Framed;

// Supervisor listens for control channel connections on a TCP port and spawns a control loop in a
// task of its own for each incoming connection. It owns those tasks and reaps them when the
// server shuts down.
pub(super) struct Supervisor<D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    pub listener: TcpListener,
    pub config: Arc<Config<D, U>>,
    pub shutdown: Arc<shutdown::Shutdown>,
    pub live_sessions: Arc<AtomicUsize>,
    pub max_sessions: usize,
    pub shutdown_grace_period: Duration,
    pub logger: slog::Logger,
}

/// Keeps the live session count honest however the session task ends, aborts included.
struct LiveSession(Arc<AtomicUsize>);

impl LiveSession {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        LiveSession(counter.clone())
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<D, U> Supervisor<D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    pub async fn run(self) {
        let Supervisor {
            listener,
            config,
            shutdown,
            live_sessions,
            max_sessions,
            shutdown_grace_period,
            logger,
        } = self;
        let mut stopping = shutdown.watch();
        let mut sessions: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                _ = stopping.requested() => break,
                accepted = listener.accept() => match accepted {
                    Ok((tcp_stream, peer)) => {
                        if live_sessions.load(Ordering::SeqCst) >= max_sessions {
                            slog::warn!(logger, "Refusing control connection, session limit reached"; "source" => %peer, "max" => max_sessions);
                            tokio::spawn(refuse(tcp_stream, config.max_command_length, logger.clone()));
                            continue;
                        }
                        slog::info!(logger, "Incoming control connection"; "source" => %peer);
                        let guard = LiveSession::enter(&live_sessions);
                        let session_shutdown = shutdown.watch();
                        sessions.spawn(session(config.clone(), tcp_stream, peer, session_shutdown, guard, logger.clone()));
                    }
                    Err(err) => slog::error!(logger, "Error accepting incoming control connection {:?}", err),
                },
                joined = sessions.join_next(), if !sessions.is_empty() => {
                    if let Some(Err(err)) = joined {
                        if err.is_panic() {
                            slog::error!(logger, "A session task panicked: {}", err);
                        }
                    }
                }
            }
        }

        // No new connections from here on, and the supervisor is not a session to wait for.
        drop(listener);
        drop(stopping);
        slog::info!(logger, "Shutting down, waiting for sessions to end"; "sessions" => live_sessions.load(Ordering::SeqCst));
        if tokio::time::timeout(shutdown_grace_period, shutdown.drained()).await.is_err() {
            slog::warn!(logger, "Grace period expired, aborting the remaining sessions"; "sessions" => live_sessions.load(Ordering::SeqCst));
        }
        sessions.abort_all();
        while sessions.join_next().await.is_some() {}
        slog::info!(logger, "Server stopped");
    }
}

async fn session<D, U>(
    config: Arc<Config<D, U>>,
    tcp_stream: TcpStream,
    peer: SocketAddr,
    shutdown: shutdown::ShutdownWatch,
    _guard: LiveSession,
    logger: slog::Logger,
) where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    if let Err(err) = control_loop::serve(config, tcp_stream, shutdown, logger.clone()).await {
        slog::debug!(logger, "Session ended with error: {}", err; "source" => %peer);
    }
}

async fn refuse(tcp_stream: TcpStream, max_command_length: usize, logger: slog::Logger) {
    let mut channel = Framed::new(tcp_stream, FtpCodec::new(max_command_length));
    if let Err(err) = channel.send(Reply::new(ReplyCode::ServiceNotAvailable, "Too many connections")).await {
        slog::debug!(logger, "Could not refuse connection politely: {}", err);
    }
}
