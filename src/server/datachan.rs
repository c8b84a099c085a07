//! Contains code pertaining to the FTP *data* channel: the connection a single file or listing
//! travels over, and the task that moves its bytes.

use super::{
    io::{CopyError, CrlfToLf, LfToCrlf, Translation, copy_data},
    session::TransferType,
    switchboard::PortLease,
};
use crate::{
    server::controlchan::{Reply, ReplyCode},
    storage::{ReadStream, WriteStream},
};
use std::{fmt, io, net::SocketAddr, time::Duration};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

/// A negotiated, not yet established data connection.
pub(crate) enum DataConnection {
    /// PORT / EPRT: we connect to the client.
    Active { addr: SocketAddr },
    /// PASV / EPSV: the client connects to us. The lease keeps the port reserved until the
    /// connection is accepted or given up on.
    Passive { listener: TcpListener, lease: PortLease },
}

impl fmt::Debug for DataConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataConnection::Active { addr } => write!(f, "Active({})", addr),
            DataConnection::Passive { lease, .. } => write!(f, "Passive({})", lease.port()),
        }
    }
}

impl DataConnection {
    #[tracing_attributes::instrument]
    async fn establish(self, connect_timeout: Duration) -> io::Result<TcpStream> {
        let timed_out = || io::Error::new(io::ErrorKind::TimedOut, "timed out establishing the data connection");
        match self {
            DataConnection::Active { addr } => tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
                .await
                .map_err(|_| timed_out())?,
            DataConnection::Passive { listener, lease } => {
                let (socket, _) = tokio::time::timeout(connect_timeout, listener.accept())
                    .await
                    .map_err(|_| timed_out())??;
                drop(listener);
                drop(lease);
                Ok(socket)
            }
        }
    }
}

/// What a transfer moves over the data connection.
pub(crate) enum TransferJob {
    /// `RETR`: storage to client
    Download(ReadStream),
    /// `STOR` / `APPE`: client to storage
    Upload(WriteStream),
    /// `LIST` / `NLST`: a formatted listing to the client
    Listing(Vec<u8>),
}

impl TransferJob {
    fn name(&self) -> &'static str {
        match self {
            TransferJob::Download(_) => "download",
            TransferJob::Upload(_) => "upload",
            TransferJob::Listing(_) => "listing",
        }
    }
}

/// How a transfer ended.
#[derive(Debug)]
pub(crate) enum TransferOutcome {
    Completed { kind: &'static str, bytes: u64 },
    CouldNotOpen(io::Error),
    Aborted,
    ConnectionBroken(io::Error),
    LocalError(io::Error),
}

impl TransferOutcome {
    /// The reply that reports this outcome to the client.
    pub fn reply(&self) -> Reply {
        match self {
            TransferOutcome::Completed { .. } => Reply::new(ReplyCode::ClosingDataConnection, "Closing data connection, transfer complete"),
            TransferOutcome::CouldNotOpen(_) => Reply::new(ReplyCode::CantOpenDataConnection, "No data connection established"),
            TransferOutcome::Aborted => Reply::new(ReplyCode::ConnectionClosed, "Connection closed; transfer aborted"),
            TransferOutcome::ConnectionBroken(_) => Reply::new(ReplyCode::ConnectionClosed, "Data connection unexpectedly closed"),
            TransferOutcome::LocalError(_) => Reply::new(ReplyCode::LocalError, "Local error while transferring data"),
        }
    }
}

/// A transfer running in its own task. Dropping it cancels the task.
#[derive(Debug)]
pub(crate) struct Transfer {
    cancel: CancellationToken,
    handle: JoinHandle<TransferOutcome>,
}

impl Transfer {
    /// Cancels the transfer and waits until its task has dropped the data socket.
    pub async fn abort(&mut self) -> TransferOutcome {
        self.cancel.cancel();
        self.finished().await
    }

    /// Waits for the transfer to end by itself. Cancel safe.
    pub async fn finished(&mut self) -> TransferOutcome {
        match (&mut self.handle).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => TransferOutcome::Aborted,
            Err(e) => TransferOutcome::LocalError(io::Error::other(e)),
        }
    }
}

impl Drop for Transfer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Waits for the transfer in `slot` to end, or forever if there is none. Meant for `select!`.
pub(crate) async fn wait_transfer(slot: &mut Option<Transfer>) -> TransferOutcome {
    match slot {
        Some(transfer) => transfer.finished().await,
        None => std::future::pending().await,
    }
}

/// Starts moving the bytes of `job` over `conn` in a new task.
pub(crate) fn spawn_transfer(conn: DataConnection, job: TransferJob, transfer_type: TransferType, connect_timeout: Duration, logger: slog::Logger) -> Transfer {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle = tokio::spawn(async move {
        let kind = job.name();
        let outcome = tokio::select! {
            _ = token.cancelled() => TransferOutcome::Aborted,
            outcome = run_transfer(conn, job, transfer_type, connect_timeout) => outcome,
        };
        match &outcome {
            TransferOutcome::Completed { bytes, .. } => slog::info!(logger, "Data transfer complete"; "kind" => kind, "bytes" => bytes),
            TransferOutcome::Aborted => slog::info!(logger, "Data transfer aborted"; "kind" => kind),
            other => slog::warn!(logger, "Data transfer failed: {:?}", other; "kind" => kind),
        }
        outcome
    });
    Transfer { cancel, handle }
}

async fn run_transfer(conn: DataConnection, job: TransferJob, transfer_type: TransferType, connect_timeout: Duration) -> TransferOutcome {
    let mut socket = match conn.establish(connect_timeout).await {
        Ok(socket) => socket,
        Err(e) => return TransferOutcome::CouldNotOpen(e),
    };
    let kind = job.name();
    let ascii = transfer_type == TransferType::Ascii;

    let result = match job {
        TransferJob::Download(mut reader) => {
            let translation = if ascii { Translation::ToWire(LfToCrlf::default()) } else { Translation::None };
            match copy_data(&mut reader, &mut socket, translation).await {
                Ok(bytes) => Ok(bytes),
                Err(CopyError::Read(e)) => return TransferOutcome::LocalError(e),
                Err(CopyError::Write(e)) => return TransferOutcome::ConnectionBroken(e),
            }
        }
        TransferJob::Upload(mut writer) => {
            let translation = if ascii { Translation::FromWire(CrlfToLf::default()) } else { Translation::None };
            let copied = match copy_data(&mut socket, &mut writer, translation).await {
                Ok(bytes) => bytes,
                Err(CopyError::Read(e)) => return TransferOutcome::ConnectionBroken(e),
                Err(CopyError::Write(e)) => return TransferOutcome::LocalError(e),
            };
            match writer.shutdown().await {
                Ok(()) => Ok(copied),
                Err(e) => return TransferOutcome::LocalError(e),
            }
        }
        TransferJob::Listing(bytes) => socket.write_all(&bytes).await.map(|_| bytes.len() as u64),
    };

    match result {
        Ok(bytes) => match socket.shutdown().await {
            Ok(()) => TransferOutcome::Completed { kind, bytes },
            Err(e) => TransferOutcome::ConnectionBroken(e),
        },
        Err(e) => TransferOutcome::ConnectionBroken(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    #[tokio::test]
    async fn active_download_delivers_the_bytes() {
        let client = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = client.local_addr().unwrap();
        let reader: ReadStream = Box::new(&b"hello\nworld\n"[..]);
        let mut transfer = spawn_transfer(
            DataConnection::Active { addr },
            TransferJob::Download(reader),
            TransferType::Ascii,
            Duration::from_secs(5),
            logger(),
        );
        let (mut socket, _) = client.accept().await.unwrap();
        let mut received = vec![];
        socket.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"hello\r\nworld\r\n");
        assert!(matches!(transfer.finished().await, TransferOutcome::Completed { bytes: 12, .. }));
    }

    #[tokio::test]
    async fn unreachable_client_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let mut transfer = spawn_transfer(
            DataConnection::Active { addr },
            TransferJob::Listing(b"x\r\n".to_vec()),
            TransferType::Binary,
            Duration::from_secs(5),
            logger(),
        );
        let outcome = transfer.finished().await;
        assert!(matches!(outcome, TransferOutcome::CouldNotOpen(_)));
        assert_eq!(outcome.reply().codes(), vec![ReplyCode::CantOpenDataConnection]);
    }

    #[tokio::test]
    async fn abort_cancels_a_waiting_transfer() {
        let client = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = client.local_addr().unwrap();
        // Never ends, so the transfer can only stop by being aborted.
        let (reader, _keep_open) = tokio::io::duplex(16);
        let mut transfer = spawn_transfer(
            DataConnection::Active { addr },
            TransferJob::Download(Box::new(reader)),
            TransferType::Binary,
            Duration::from_secs(5),
            logger(),
        );
        let (mut socket, _) = client.accept().await.unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(2), transfer.abort()).await.unwrap();
        assert!(matches!(outcome, TransferOutcome::Aborted));
        let mut buf = vec![];
        assert_eq!(socket.read_to_end(&mut buf).await.unwrap(), 0);
    }
}
