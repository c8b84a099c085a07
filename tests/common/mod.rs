#![allow(dead_code)]

use ftpengine_driver_fs::Filesystem;
use libftpengine::{ServerBuilder, ServerHandle, auth::UserDetail};
use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::atomic::{AtomicU16, Ordering},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

// Every server in a test binary gets its own slice of passive ports.
static PASSIVE_BASE: AtomicU16 = AtomicU16::new(50000);

pub struct TestServer {
    pub handle: ServerHandle,
    pub root: PathBuf,
    pub tempdir: tempfile::TempDir,
}

impl TestServer {
    pub fn addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    /// Polls until no passive port is reserved anymore.
    pub async fn wait_for_idle_ports(&self) {
        for _ in 0..200 {
            if self.handle.passive_ports_in_use() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} passive ports are still in use", self.handle.passive_ports_in_use());
    }

    /// Polls until the server has no sessions left.
    pub async fn wait_for_no_sessions(&self) {
        for _ in 0..200 {
            if self.handle.session_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} sessions are still running", self.handle.session_count());
    }
}

pub fn anonymous(root: PathBuf) -> ServerBuilder<Filesystem, libftpengine::auth::DefaultUser> {
    ServerBuilder::new(Box::new(move || Filesystem::new(root.clone()).unwrap()))
}

pub async fn start() -> TestServer {
    start_with(anonymous).await
}

pub async fn start_with<U, F>(make: F) -> TestServer
where
    U: UserDetail + 'static,
    F: FnOnce(PathBuf) -> ServerBuilder<Filesystem, U>,
{
    let tempdir = tempfile::TempDir::new().unwrap();
    let root = tempdir.path().to_path_buf();
    let base = PASSIVE_BASE.fetch_add(100, Ordering::Relaxed);
    let handle = make(root.clone())
        .greeting("Welcome test")
        .passive_ports(base..=base + 99)
        .logger(slog::Logger::root(slog::Discard, slog::o!()))
        .build()
        .unwrap()
        .start("127.0.0.1:0")
        .await
        .unwrap();
    TestServer {
        handle,
        root,
        tempdir,
    }
}

/// A line oriented FTP client that shows the raw replies.
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Client {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, write) = stream.into_split();
        Client {
            reader: BufReader::new(read),
            writer: write,
        }
    }

    /// Connects and swallows the greeting.
    pub async fn greeted(addr: SocketAddr) -> Client {
        let mut client = Client::connect(addr).await;
        assert_eq!(client.reply().await, "220 Welcome test");
        client
    }

    pub async fn send(&mut self, line: &str) {
        self.writer.write_all(format!("{}\r\n", line).as_bytes()).await.unwrap();
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    /// Reads one complete reply. The lines of a multi-line reply are joined with `\n`.
    pub async fn reply(&mut self) -> String {
        let first = self.line().await.expect("connection closed while waiting for a reply");
        if first.as_bytes().get(3) != Some(&b'-') {
            return first;
        }
        let end = format!("{} ", &first[..3]);
        let mut lines = vec![first];
        loop {
            let line = self.line().await.expect("connection closed in the middle of a reply");
            let done = line.starts_with(&end);
            lines.push(line);
            if done {
                return lines.join("\n");
            }
        }
    }

    pub async fn cmd(&mut self, line: &str) -> String {
        self.send(line).await;
        self.reply().await
    }

    pub async fn login(&mut self, user: &str, pass: &str) {
        assert_eq!(self.cmd(&format!("USER {}", user)).await, "331 Password Required");
        assert_eq!(self.cmd(&format!("PASS {}", pass)).await, "230 User logged in, proceed");
    }

    /// Sends `PASV` and returns the address to connect the data connection to.
    pub async fn pasv(&mut self) -> SocketAddr {
        let reply = self.cmd("PASV").await;
        parse_pasv(&reply)
    }

    /// True once the server has closed the control connection.
    pub async fn is_closed(&mut self) -> bool {
        let mut buf = String::new();
        matches!(tokio::time::timeout(REPLY_TIMEOUT, self.reader.read_line(&mut buf)).await, Ok(Ok(0)) | Ok(Err(_)))
    }

    async fn line(&mut self) -> Option<String> {
        let mut buf = String::new();
        let n = tokio::time::timeout(REPLY_TIMEOUT, self.reader.read_line(&mut buf))
            .await
            .expect("timed out waiting for a reply")
            .unwrap();
        if n == 0 {
            return None;
        }
        assert!(buf.ends_with("\r\n"), "reply line not terminated by CRLF: {:?}", buf);
        Some(buf.trim_end_matches("\r\n").to_string())
    }
}

pub fn parse_pasv(reply: &str) -> SocketAddr {
    assert!(reply.starts_with("227 Entering Passive Mode ("), "unexpected PASV reply: {}", reply);
    let inner = &reply[reply.find('(').unwrap() + 1..reply.find(')').unwrap()];
    let nums: Vec<u16> = inner.split(',').map(|n| n.parse().unwrap()).collect();
    assert_eq!(nums.len(), 6);
    let ip = std::net::Ipv4Addr::new(nums[0] as u8, nums[1] as u8, nums[2] as u8, nums[3] as u8);
    SocketAddr::from((ip, nums[4] * 256 + nums[5]))
}

pub async fn upload(addr: SocketAddr, data: &[u8]) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(data).await.unwrap();
    stream.shutdown().await.unwrap();
}

pub async fn download(addr: SocketAddr) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut data = vec![];
    stream.read_to_end(&mut data).await.unwrap();
    data
}

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0; len];
    getrandom::fill(&mut data).unwrap();
    data
}
