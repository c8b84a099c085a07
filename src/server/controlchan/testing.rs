//! Helpers for running command handlers without a network connection.

use super::{
    Reply,
    control_loop::Config,
    dispatch::DispatchTable,
    error::ControlChanError,
    handler::{CommandContext, CommandHandler},
};
use crate::{
    auth::{AllowAll, AnonymousAuthenticator, DefaultUser},
    server::{
        ftpserver::options::PassiveHost,
        session::{Session, SessionState},
        switchboard::Switchboard,
    },
};
use ftpengine_driver_fs::Filesystem;
use std::{path::Path, sync::Arc, time::Duration};

pub(crate) type TestConfig = Config<Filesystem, DefaultUser>;

/// A logged in session on a temporary directory.
pub(crate) struct Harness {
    pub config: TestConfig,
    pub session: Session<Filesystem, DefaultUser>,
    pub logger: slog::Logger,
    root: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let root = tempfile::TempDir::new().unwrap();
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let path = root.path().to_path_buf();
        let config = Config {
            driver_factory: Box::new(move || Filesystem::new(path.clone()).unwrap()),
            authenticator: Arc::new(AnonymousAuthenticator),
            authorizer: Arc::new(AllowAll),
            dispatch: DispatchTable::new(),
            greeting: String::from("hi"),
            passive_host: PassiveHost::FromConnection,
            switchboard: Arc::new(Switchboard::new(logger.clone(), 50000..=50100)),
            idle_session_timeout: Duration::from_secs(60),
            data_connect_timeout: Duration::from_secs(2),
            max_command_length: 4096,
            collect_metrics: false,
        };
        let mut session = Session::new();
        session.state = SessionState::Authenticated;
        session.user = Some(Arc::new(DefaultUser));
        session.driver = Some(Arc::new((config.driver_factory)()));
        Harness {
            config,
            session,
            logger,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub async fn run<H>(&mut self, handler: H, arg: &str) -> Result<Reply, ControlChanError>
    where
        H: CommandHandler<Filesystem, DefaultUser>,
    {
        let args = CommandContext {
            arg,
            session: &mut self.session,
            config: &self.config,
            local_addr: "127.0.0.1:21".parse().unwrap(),
            peer_addr: "127.0.0.1:40000".parse().unwrap(),
            logger: &self.logger,
        };
        handler.handle(args).await
    }
}
