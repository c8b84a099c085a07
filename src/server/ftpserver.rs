pub mod error;
mod listen;
pub mod options;

use super::{
    controlchan::{control_loop::Config, dispatch::DispatchTable},
    shutdown,
    switchboard::Switchboard,
};
use crate::{
    auth::{AllowAll, AnonymousAuthenticator, Authenticator, Authorizer, DefaultUser, UserDetail},
    storage::Driver,
};
use error::ServerError;
use options::PassiveHost;
use slog::Drain;
use std::{
    fmt::{self, Debug, Formatter},
    future::Future,
    net::SocketAddr,
    ops::RangeInclusive,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{net::ToSocketAddrs, task::JoinHandle};

type ShutdownIndicator = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Collects the settings of an FTP server and builds a [`Server`] from them.
///
/// The builder is generic over the storage [`Driver`] (`D`) and the user type (`U`) that the
/// [`Authenticator`] produces. A fresh driver is obtained from the factory for every session, so
/// drivers can keep per session state.
///
/// # Example
///
/// ```rust
/// use ftpengine_driver_fs::Filesystem;
/// use libftpengine::ServerBuilder;
///
/// let server = ServerBuilder::new(Box::new(|| Filesystem::new("/tmp").unwrap()))
///     .greeting("Welcome to my FTP server")
///     .passive_ports(50000..=65535)
///     .build()
///     .unwrap();
/// ```
pub struct ServerBuilder<D, U>
where
    D: Driver<U>,
    U: UserDetail,
{
    driver_factory: Box<dyn Fn() -> D + Send + Sync>,
    authenticator: Arc<dyn Authenticator<U>>,
    authorizer: Arc<dyn Authorizer<U>>,
    greeting: String,
    passive_ports: RangeInclusive<u16>,
    passive_host: PassiveHost,
    idle_session_timeout: Duration,
    max_sessions: usize,
    data_connect_timeout: Duration,
    shutdown_grace_period: Duration,
    shutdown_indicator: Option<ShutdownIndicator>,
    max_command_length: usize,
    logger: slog::Logger,
    collect_metrics: bool,
}

impl<D> ServerBuilder<D, DefaultUser>
where
    D: Driver<DefaultUser> + 'static,
{
    /// Creates a builder for a server that lets every user in with the [`AnonymousAuthenticator`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use ftpengine_driver_fs::Filesystem;
    /// use libftpengine::ServerBuilder;
    ///
    /// let builder = ServerBuilder::new(Box::new(|| Filesystem::new("/srv/ftp").unwrap()));
    /// ```
    pub fn new(driver_factory: Box<dyn Fn() -> D + Send + Sync>) -> Self {
        Self::with_authenticator(driver_factory, Arc::new(AnonymousAuthenticator))
    }
}

impl<D, U> ServerBuilder<D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    /// Creates a builder that checks logins with the given authenticator.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ftpengine_driver_fs::Filesystem;
    /// use libftpengine::{auth::AnonymousAuthenticator, ServerBuilder};
    /// use std::sync::Arc;
    ///
    /// let builder = ServerBuilder::with_authenticator(
    ///     Box::new(|| Filesystem::new("/srv/ftp").unwrap()),
    ///     Arc::new(AnonymousAuthenticator),
    /// );
    /// ```
    pub fn with_authenticator(driver_factory: Box<dyn Fn() -> D + Send + Sync>, authenticator: Arc<dyn Authenticator<U>>) -> Self {
        ServerBuilder {
            driver_factory,
            authenticator,
            authorizer: Arc::new(AllowAll),
            greeting: options::DEFAULT_GREETING.to_string(),
            passive_ports: options::DEFAULT_PASSIVE_PORTS,
            passive_host: PassiveHost::default(),
            idle_session_timeout: options::DEFAULT_IDLE_SESSION_TIMEOUT,
            max_sessions: options::DEFAULT_MAX_SESSIONS,
            data_connect_timeout: options::DEFAULT_DATA_CONNECT_TIMEOUT,
            shutdown_grace_period: options::DEFAULT_SHUTDOWN_GRACE_PERIOD,
            shutdown_indicator: None,
            max_command_length: options::DEFAULT_MAX_COMMAND_LENGTH,
            logger: slog::Logger::root(slog_stdlog::StdLog.fuse(), slog::o!()),
            collect_metrics: false,
        }
    }

    /// Sets the [`Authorizer`] that decides, per operation, what an authenticated user may do.
    /// By default everything is allowed.
    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer<U>>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Sets the text of the `220` greeting sent to every new client.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ftpengine_driver_fs::Filesystem;
    /// use libftpengine::ServerBuilder;
    ///
    /// let builder = ServerBuilder::new(Box::new(|| Filesystem::new("/tmp").unwrap())).greeting("Welcome to my FTP Server");
    /// ```
    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Sets the range of ports that passive data connections listen on. Both ends are included.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ftpengine_driver_fs::Filesystem;
    /// use libftpengine::ServerBuilder;
    ///
    /// let builder = ServerBuilder::new(Box::new(|| Filesystem::new("/tmp").unwrap())).passive_ports(49152..=65535);
    /// ```
    pub fn passive_ports(mut self, range: RangeInclusive<u16>) -> Self {
        self.passive_ports = range;
        self
    }

    /// Sets the IP address advertised in replies to `PASV`. By default the address the client
    /// connected to is used, which is wrong behind NAT.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ftpengine_driver_fs::Filesystem;
    /// use libftpengine::ServerBuilder;
    ///
    /// let builder = ServerBuilder::new(Box::new(|| Filesystem::new("/tmp").unwrap())).passive_host([203, 0, 113, 7]);
    /// ```
    pub fn passive_host<H: Into<PassiveHost>>(mut self, host: H) -> Self {
        self.passive_host = host.into();
        self
    }

    /// Sets how long a session may sit idle before it is closed. Time spent transferring doesn't
    /// count as idle.
    pub fn idle_session_timeout(mut self, timeout: Duration) -> Self {
        self.idle_session_timeout = timeout;
        self
    }

    /// Sets the number of concurrent sessions. Clients connecting beyond that get a `421` and are
    /// disconnected.
    pub fn max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Sets how long a transfer waits for the client to open or accept its data connection.
    pub fn data_connect_timeout(mut self, timeout: Duration) -> Self {
        self.data_connect_timeout = timeout;
        self
    }

    /// Sets how long a shutdown waits for running transfers before sessions are aborted.
    pub fn shutdown_grace_period(mut self, grace: Duration) -> Self {
        self.shutdown_grace_period = grace;
        self
    }

    /// Makes [`Server::listen`] shut the server down gracefully once the given future completes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ftpengine_driver_fs::Filesystem;
    /// use libftpengine::ServerBuilder;
    ///
    /// let builder = ServerBuilder::new(Box::new(|| Filesystem::new("/tmp").unwrap())).shutdown_indicator(async {
    ///     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    /// });
    /// ```
    pub fn shutdown_indicator<I>(mut self, indicator: I) -> Self
    where
        I: Future<Output = ()> + Send + 'static,
    {
        self.shutdown_indicator = Some(Box::pin(indicator));
        self
    }

    /// Sets the longest command line accepted, CRLF included. Longer lines get a `500`.
    pub fn max_command_length(mut self, max: usize) -> Self {
        self.max_command_length = max;
        self
    }

    /// Sets the structured logger. Defaults to forwarding to the `log` crate.
    pub fn logger<L: Into<Option<slog::Logger>>>(mut self, logger: L) -> Self {
        self.logger = logger.into().unwrap_or_else(|| slog::Logger::root(slog_stdlog::StdLog.fuse(), slog::o!()));
        self
    }

    /// Enables the collection of prometheus metrics. Without the `prometheus` feature this has no
    /// effect.
    pub fn metrics(mut self, enabled: bool) -> Self {
        self.collect_metrics = enabled;
        self
    }

    /// Checks the settings and builds the [`Server`].
    pub fn build(self) -> Result<Server<D, U>, ServerError> {
        if self.passive_ports.is_empty() {
            return Err(ServerError::config("the passive port range is empty"));
        }
        if *self.passive_ports.start() == 0 {
            return Err(ServerError::config("port 0 cannot be used for passive connections"));
        }
        if self.max_sessions == 0 {
            return Err(ServerError::config("max_sessions must be at least 1"));
        }
        if self.max_command_length < 3 {
            return Err(ServerError::config("max_command_length is too small to hold a command"));
        }

        let switchboard = Arc::new(Switchboard::new(self.logger.clone(), self.passive_ports.clone()));
        let config = Config {
            driver_factory: self.driver_factory,
            authenticator: self.authenticator,
            authorizer: self.authorizer,
            dispatch: DispatchTable::new(),
            greeting: self.greeting,
            passive_host: self.passive_host,
            switchboard,
            idle_session_timeout: self.idle_session_timeout,
            data_connect_timeout: self.data_connect_timeout,
            max_command_length: self.max_command_length,
            collect_metrics: self.collect_metrics,
        };
        Ok(Server {
            config: Arc::new(config),
            max_sessions: self.max_sessions,
            shutdown_grace_period: self.shutdown_grace_period,
            shutdown_indicator: self.shutdown_indicator,
            logger: self.logger,
        })
    }
}

impl<D, U> Debug for ServerBuilder<D, U>
where
    D: Driver<U>,
    U: UserDetail,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("greeting", &self.greeting)
            .field("passive_ports", &self.passive_ports)
            .field("passive_host", &self.passive_host)
            .field("idle_session_timeout", &self.idle_session_timeout)
            .field("max_sessions", &self.max_sessions)
            .field("data_connect_timeout", &self.data_connect_timeout)
            .field("shutdown_grace_period", &self.shutdown_grace_period)
            .field("max_command_length", &self.max_command_length)
            .field("collect_metrics", &self.collect_metrics)
            .finish()
    }
}

/// A configured FTP server, ready to accept connections.
///
/// Use [`Server::listen`] to run it until its shutdown indicator fires, or [`Server::start`] to
/// get a [`ServerHandle`] and control it yourself.
pub struct Server<D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    config: Arc<Config<D, U>>,
    max_sessions: usize,
    shutdown_grace_period: Duration,
    shutdown_indicator: Option<ShutdownIndicator>,
    logger: slog::Logger,
}

impl<D, U> Server<D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    /// Binds the control port and starts accepting connections in the background. Must be called
    /// from within a tokio runtime.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ftpengine_driver_fs::Filesystem;
    /// use libftpengine::ServerBuilder;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let server = ServerBuilder::new(Box::new(|| Filesystem::new(std::env::temp_dir()).unwrap())).build().unwrap();
    /// let handle = server.start("127.0.0.1:0").await.unwrap();
    /// println!("listening on {}", handle.local_addr());
    /// handle.shutdown().await.unwrap();
    /// # }
    /// ```
    pub async fn start<A: ToSocketAddrs>(self, bind_address: A) -> Result<ServerHandle, ServerError> {
        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .map_err(|e| ServerError::new("could not bind the control port", e))?;
        let local_addr = listener.local_addr()?;
        slog::info!(self.logger, "Listening for control connections"; "address" => %local_addr);

        let shutdown = Arc::new(shutdown::Shutdown::new());
        let live_sessions = Arc::new(AtomicUsize::new(0));
        let switchboard = self.config.switchboard.clone();
        let supervisor = listen::Supervisor {
            listener,
            config: self.config,
            shutdown: shutdown.clone(),
            live_sessions: live_sessions.clone(),
            max_sessions: self.max_sessions,
            shutdown_grace_period: self.shutdown_grace_period,
            logger: self.logger,
        };
        let supervisor = tokio::spawn(supervisor.run());

        Ok(ServerHandle {
            local_addr,
            shutdown,
            live_sessions,
            switchboard,
            supervisor,
        })
    }

    /// Runs the server on the given address until the shutdown indicator set with
    /// [`ServerBuilder::shutdown_indicator`] completes, then shuts it down gracefully. Without an
    /// indicator this never returns, unless binding fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ftpengine_driver_fs::Filesystem;
    /// use libftpengine::ServerBuilder;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let server = ServerBuilder::new(Box::new(|| Filesystem::new("/srv/ftp").unwrap())).build().unwrap();
    /// server.listen("127.0.0.1:2121").await.unwrap();
    /// # }
    /// ```
    pub async fn listen<A: ToSocketAddrs>(mut self, bind_address: A) -> Result<(), ServerError> {
        let indicator = self.shutdown_indicator.take();
        let handle = self.start(bind_address).await?;
        match indicator {
            Some(indicator) => indicator.await,
            None => std::future::pending::<()>().await,
        }
        handle.shutdown().await
    }
}

impl<D, U> Debug for Server<D, U>
where
    D: Driver<U> + 'static,
    U: UserDetail + 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("greeting", &self.config.greeting)
            .field("max_sessions", &self.max_sessions)
            .field("shutdown_grace_period", &self.shutdown_grace_period)
            .finish()
    }
}

/// Controls a running server that was started with [`Server::start`].
///
/// Dropping the handle leaves the server running.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Arc<shutdown::Shutdown>,
    live_sessions: Arc<AtomicUsize>,
    switchboard: Arc<Switchboard>,
    supervisor: JoinHandle<()>,
}

impl ServerHandle {
    /// The address the control port is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The number of sessions currently being served.
    pub fn session_count(&self) -> usize {
        self.live_sessions.load(Ordering::SeqCst)
    }

    /// The number of passive ports currently reserved by sessions.
    pub fn passive_ports_in_use(&self) -> usize {
        self.switchboard.in_use()
    }

    /// Stops accepting connections and tells every session to close. Sessions that are in the
    /// middle of a transfer get to finish it within the grace period; after that they are aborted.
    /// Returns once every session is gone.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        self.shutdown.begin();
        self.supervisor.await?;
        Ok(())
    }
}
