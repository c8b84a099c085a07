//! The per-connection state of an FTP session. A `Session` is owned by the control loop task of
//! its connection and is never shared, so it needs no locking.

use super::datachan::{DataConnection, Transfer, TransferOutcome};
use crate::{
    auth::UserDetail,
    storage::Driver,
};
use std::{
    fmt,
    path::{Component, Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Identifies a session in log output and in the passive port pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TraceId(u64);

impl TraceId {
    pub fn new() -> Self {
        static FALLBACK: AtomicU64 = AtomicU64::new(1);
        TraceId(getrandom::u64().unwrap_or_else(|_| FALLBACK.fetch_add(1, Ordering::Relaxed)))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Connected,
    AwaitingPassword,
    Authenticated,
}

/// The representation type set with `TYPE`. Only affects file transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransferType {
    Ascii,
    Binary,
}

/// Why the session stopped reading commands while a transfer finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Drain {
    Quit,
    Shutdown,
}

// This is where we keep the state for a ftp session.
pub(crate) struct Session<D, U>
where
    D: Driver<U>,
    U: UserDetail,
{
    pub trace_id: TraceId,
    pub state: SessionState,
    pub username: Option<String>,
    pub user: Option<Arc<U>>,
    pub driver: Option<Arc<D>>,
    // The virtual, absolute working directory. Always starts with '/'.
    pub cwd: PathBuf,
    pub transfer_type: TransferType,
    pub rename_from: Option<PathBuf>,
    pub start_pos: u64,
    // The data connection negotiated by PORT/EPRT/PASV/EPSV and not yet used by a transfer.
    pub data: Option<DataConnection>,
    pub transfer: Option<Transfer>,
    pub draining: Option<Drain>,
}

impl<D, U> Session<D, U>
where
    D: Driver<U>,
    U: UserDetail,
{
    pub fn new() -> Self {
        Session {
            trace_id: TraceId::new(),
            state: SessionState::Connected,
            username: None,
            user: None,
            driver: None,
            cwd: PathBuf::from("/"),
            transfer_type: TransferType::Binary,
            rename_from: None,
            start_pos: 0,
            data: None,
            transfer: None,
            draining: None,
        }
    }

    /// Forgets the logged in user and everything that was set up on their behalf. Used by `USER`.
    pub fn reset_login(&mut self) {
        self.state = SessionState::Connected;
        self.username = None;
        self.user = None;
        self.driver = None;
        self.cwd = PathBuf::from("/");
        self.rename_from = None;
        self.start_pos = 0;
        self.data = None;
        // Dropping a transfer cancels it.
        self.transfer = None;
    }

    /// Cancels the running transfer, if any, and waits for its task to let go of the data socket.
    pub async fn abort_transfer(&mut self) -> Option<TransferOutcome> {
        let mut transfer = self.transfer.take()?;
        Some(transfer.abort().await)
    }

    /// Resolves a path argument against the working directory into an absolute virtual path.
    /// `..` never climbs above the root.
    pub fn resolve(&self, arg: &str) -> PathBuf {
        resolve(&self.cwd, arg)
    }
}

impl<D, U> fmt::Debug for Session<D, U>
where
    D: Driver<U>,
    U: UserDetail,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("trace_id", &self.trace_id)
            .field("state", &self.state)
            .field("username", &self.username)
            .field("cwd", &self.cwd)
            .field("transfer_type", &self.transfer_type)
            .field("rename_from", &self.rename_from)
            .field("start_pos", &self.start_pos)
            .field("data", &self.data)
            .field("transfer", &self.transfer.is_some())
            .finish()
    }
}

pub(crate) fn resolve(cwd: &Path, arg: &str) -> PathBuf {
    let arg = Path::new(arg);
    let mut resolved = if arg.has_root() { PathBuf::from("/") } else { cwd.to_path_buf() };
    for component in arg.components() {
        match component {
            Component::Normal(name) => resolved.push(name),
            Component::ParentDir => {
                resolved.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    resolved
}
