//! The shutdown signal that the supervisor sends its sessions, and the means to wait for them to
//! finish.

use tokio::sync::watch;

/// Owned by the server. Starts a graceful shutdown and tracks which sessions still run.
///
/// Every session holds a [`ShutdownWatch`]. The server is drained once all of them are dropped.
#[derive(Debug)]
pub(crate) struct Shutdown {
    stopping: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Shutdown {
        let (stopping, _) = watch::channel(false);
        Shutdown { stopping }
    }

    /// Tells every session, present and future, that the server is going down.
    pub fn begin(&self) {
        self.stopping.send_replace(true);
    }

    /// Hands out a watch for a new session. A session that starts after [`Shutdown::begin`] sees
    /// the signal right away.
    pub fn watch(&self) -> ShutdownWatch {
        ShutdownWatch {
            stopping: self.stopping.subscribe(),
        }
    }

    /// Completes once every [`ShutdownWatch`] handed out has been dropped.
    pub async fn drained(&self) {
        self.stopping.closed().await
    }

    #[cfg(test)]
    fn watching(&self) -> usize {
        self.stopping.receiver_count()
    }
}

/// A session's end of the shutdown signal. Dropping it tells the server the session is done.
#[derive(Debug)]
pub(crate) struct ShutdownWatch {
    stopping: watch::Receiver<bool>,
}

impl ShutdownWatch {
    /// Waits until shutdown begins. Safe to use in `select!`: the state is kept in the channel,
    /// so a cancelled wait loses nothing.
    pub async fn requested(&mut self) {
        // An error means the server is gone altogether, which counts as a shutdown.
        let _ = self.stopping.wait_for(|stopping| *stopping).await;
    }
}
