#![allow(missing_docs)]

mod common;

use common::{Client, download, random_bytes, upload};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::{
    collections::HashSet,
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

#[tokio::test]
async fn upload_and_download_in_passive_mode() {
    let server = common::start().await;
    let data = random_bytes(500 * 1024);

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;
    assert_eq!(client.cmd("TYPE I").await, "200 Switching to binary mode");

    let data_addr = client.pasv().await;
    assert_eq!(data_addr.ip(), Ipv4Addr::LOCALHOST);
    assert_eq!(client.cmd("STOR big.bin").await, "150 Ready to receive data");
    upload(data_addr, &data).await;
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");
    assert_eq!(std::fs::read(server.root.join("big.bin")).unwrap(), data);

    let data_addr = client.pasv().await;
    assert_eq!(client.cmd("RETR big.bin").await, "150 Sending data");
    let received = download(data_addr).await;
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");
    assert!(received == data, "downloaded data differs from the uploaded data");

    assert_eq!(client.cmd("QUIT").await, "221 Bye!");
    assert!(client.is_closed().await);
    server.wait_for_idle_ports().await;
}

#[derive(Debug, Clone, Copy)]
enum DataMode {
    Active,
    Passive,
}

/// Opens the data connection for the next transfer command, in the given mode. The returned
/// future connects (passive) or accepts (active) once the transfer command has been sent.
async fn prepare_data(client: &mut Client, mode: DataMode) -> DataEndpoint {
    match mode {
        DataMode::Passive => DataEndpoint::Passive(client.pasv().await),
        DataMode::Active => {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            assert_eq!(
                client.cmd(&format!("PORT 127,0,0,1,{},{}", port >> 8, port & 0xff)).await,
                "200 PORT command successful"
            );
            DataEndpoint::Active(listener)
        }
    }
}

enum DataEndpoint {
    Active(TcpListener),
    Passive(SocketAddr),
}

impl DataEndpoint {
    async fn open(self) -> tokio::net::TcpStream {
        match self {
            DataEndpoint::Active(listener) => listener.accept().await.unwrap().0,
            DataEndpoint::Passive(addr) => tokio::net::TcpStream::connect(addr).await.unwrap(),
        }
    }
}

#[rstest]
#[case::empty(0)]
#[case::one_byte(1)]
#[case::one_buffer(65536)]
#[case::ten_megabytes(10_000_000)]
#[tokio::test]
async fn transfer_sizes(#[case] size: usize, #[values(DataMode::Active, DataMode::Passive)] mode: DataMode) {
    let server = common::start().await;
    let data = random_bytes(size);

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;

    let endpoint = prepare_data(&mut client, mode).await;
    assert_eq!(client.cmd("STOR file.bin").await, "150 Ready to receive data");
    let mut stream = endpoint.open().await;
    stream.write_all(&data).await.unwrap();
    stream.shutdown().await.unwrap();
    drop(stream);
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");

    assert_eq!(client.cmd("SIZE file.bin").await, format!("213 {}", size));

    let endpoint = prepare_data(&mut client, mode).await;
    assert_eq!(client.cmd("RETR file.bin").await, "150 Sending data");
    let mut stream = endpoint.open().await;
    let mut received = vec![];
    stream.read_to_end(&mut received).await.unwrap();
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");
    assert_eq!(received.len(), size);
    assert!(received == data, "downloaded data differs from the uploaded data");

    server.wait_for_idle_ports().await;
}

#[tokio::test]
async fn active_mode_download_and_upload() {
    let server = common::start().await;
    std::fs::write(server.root.join("hello.txt"), b"Hello active mode").unwrap();

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    assert_eq!(
        client.cmd(&format!("PORT 127,0,0,1,{},{}", port >> 8, port & 0xff)).await,
        "200 PORT command successful"
    );
    assert_eq!(client.cmd("RETR hello.txt").await, "150 Sending data");
    let (mut stream, _) = listener.accept().await.unwrap();
    let mut received = vec![];
    stream.read_to_end(&mut received).await.unwrap();
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");
    assert_eq!(received, b"Hello active mode");

    assert_eq!(client.cmd(&format!("EPRT |1|127.0.0.1|{}|", port)).await, "200 EPRT command successful");
    assert_eq!(client.cmd("STOR copy.txt").await, "150 Ready to receive data");
    let (mut stream, _) = listener.accept().await.unwrap();
    stream.write_all(b"Hello back").await.unwrap();
    drop(stream);
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");
    assert_eq!(std::fs::read(server.root.join("copy.txt")).unwrap(), b"Hello back");
}

#[tokio::test]
async fn extended_passive_mode() {
    let server = common::start().await;
    std::fs::write(server.root.join("a.txt"), b"").unwrap();

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;

    let reply = client.cmd("EPSV").await;
    let port: u16 = reply
        .strip_prefix("229 Entering Extended Passive Mode (|||")
        .and_then(|rest| rest.strip_suffix("|)"))
        .unwrap_or_else(|| panic!("unexpected EPSV reply: {}", reply))
        .parse()
        .unwrap();
    assert_eq!(client.cmd("NLST").await, "150 Sending directory list");
    let listing = download(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).await;
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");
    assert_eq!(listing, b"a.txt\r\n");

    assert_eq!(client.cmd("EPSV 3").await, "522 Network protocol not supported, use (1,2)");
}

#[tokio::test]
async fn ascii_mode_translates_line_endings() {
    let server = common::start().await;
    std::fs::write(server.root.join("unix.txt"), b"one\ntwo\n").unwrap();

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;
    assert_eq!(client.cmd("TYPE A").await, "200 Switching to ASCII mode");

    let data_addr = client.pasv().await;
    assert_eq!(client.cmd("RETR unix.txt").await, "150 Sending data");
    assert_eq!(download(data_addr).await, b"one\r\ntwo\r\n");
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");

    let data_addr = client.pasv().await;
    assert_eq!(client.cmd("STOR dos.txt").await, "150 Ready to receive data");
    upload(data_addr, b"three\r\nfour\r\n").await;
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");
    assert_eq!(std::fs::read(server.root.join("dos.txt")).unwrap(), b"three\nfour\n");
}

#[tokio::test]
async fn commands_need_a_login() {
    let server = common::start().await;
    let mut client = Client::greeted(server.addr()).await;

    assert_eq!(client.cmd("LIST").await, "530 Please authenticate");
    assert_eq!(client.cmd("PWD").await, "530 Please authenticate");
    assert_eq!(client.cmd("PASS early").await, "503 Please give me a username first");
    assert_eq!(client.cmd("SYST").await, "215 UNIX Type: L8");
    assert_eq!(client.cmd("NOOP").await, "200 Successfully did nothing");

    let feat = client.cmd("FEAT").await;
    assert!(feat.starts_with("211-Extensions supported:"), "{}", feat);
    assert!(feat.contains("\n EPSV\n"), "{}", feat);
    assert!(feat.ends_with("\n211 END"), "{}", feat);

    assert_eq!(client.cmd("USER test").await, "331 Password Required");
    assert_eq!(client.cmd("CWD /").await, "530 Please authenticate");
}

#[tokio::test]
async fn malformed_and_unknown_commands() {
    let server = common::start_with(|root| common::anonymous(root).max_command_length(64)).await;
    let mut client = Client::greeted(server.addr()).await;

    assert_eq!(client.cmd("FROBNICATE").await, "500 Command not implemented");
    assert_eq!(client.cmd(&format!("USER {}", "x".repeat(100))).await, "500 Command line too long");
    client.send_raw(b"USER \xff\xfe\r\n").await;
    assert_eq!(client.reply().await, "500 Invalid UTF8 in command");

    // The session is still usable
    client.login("test", "test").await;
    assert_eq!(client.cmd("PWD").await, "257 \"/\" is the current directory");
}

#[tokio::test]
async fn rename_needs_a_preceding_rnfr() {
    let server = common::start().await;
    std::fs::write(server.root.join("a.txt"), b"a").unwrap();

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;

    assert_eq!(client.cmd("RNTO b.txt").await, "503 Please tell me what file you want to rename first");
    assert_eq!(client.cmd("RNFR missing.txt").await, "550 File not found");

    // Any other command in between forgets the source
    assert_eq!(client.cmd("RNFR a.txt").await, "350 Tell me, what would you like the new name to be?");
    assert_eq!(client.cmd("NOOP").await, "200 Successfully did nothing");
    assert_eq!(client.cmd("RNTO b.txt").await, "503 Please tell me what file you want to rename first");

    assert_eq!(client.cmd("RNFR a.txt").await, "350 Tell me, what would you like the new name to be?");
    assert_eq!(client.cmd("RNTO b.txt").await, "250 Renamed");
    assert!(!server.root.join("a.txt").exists());
    assert_eq!(std::fs::read(server.root.join("b.txt")).unwrap(), b"a");
}

#[tokio::test]
async fn directories() {
    let server = common::start().await;
    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;

    assert_eq!(client.cmd("MKD docs").await, "257 \"/docs\" created");
    assert_eq!(client.cmd("CWD docs").await, "250 Okay.");
    assert_eq!(client.cmd("PWD").await, "257 \"/docs\" is the current directory");
    assert_eq!(client.cmd("CWD nope").await, "550 File not found");
    assert_eq!(client.cmd("CDUP").await, "250 Okay.");
    assert_eq!(client.cmd("XPWD").await, "257 \"/\" is the current directory");

    let _ = client.pasv().await;
    assert_eq!(client.cmd("STOR docs").await, "550 File not found");
    assert!(server.root.join("docs").is_dir());

    assert_eq!(client.cmd("RMD docs").await, "250 Folder successfully removed");
    assert!(!server.root.join("docs").exists());
}

#[tokio::test]
async fn rest_resumes_a_download() {
    let server = common::start().await;
    std::fs::write(server.root.join("digits.txt"), b"0123456789").unwrap();

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;

    assert_eq!(client.cmd("REST 4").await, "350 Restarting at 4. Now send STORE or RETRIEVE.");
    let data_addr = client.pasv().await;
    assert_eq!(client.cmd("RETR digits.txt").await, "150 Sending data");
    assert_eq!(download(data_addr).await, b"456789");
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");

    assert_eq!(client.cmd("REST 11").await, "350 Restarting at 11. Now send STORE or RETRIEVE.");
    let _ = client.pasv().await;
    assert_eq!(client.cmd("RETR digits.txt").await, "554 Restart offset beyond end of file");
}

#[tokio::test]
async fn append_adds_to_the_end() {
    let server = common::start().await;
    std::fs::write(server.root.join("log.txt"), b"first\n").unwrap();

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;

    let data_addr = client.pasv().await;
    assert_eq!(client.cmd("APPE log.txt").await, "150 Ready to receive data");
    upload(data_addr, b"second\n").await;
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");
    assert_eq!(std::fs::read(server.root.join("log.txt")).unwrap(), b"first\nsecond\n");
}

#[tokio::test]
async fn abort_a_running_transfer() {
    let server = common::start().await;
    std::fs::write(server.root.join("big.bin"), random_bytes(1024 * 1024)).unwrap();

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;
    assert_eq!(client.cmd("ABOR").await, "225 No transfer in progress");

    // The data connection is never opened, so the transfer sits waiting for it.
    let _ = client.pasv().await;
    assert_eq!(client.cmd("RETR big.bin").await, "150 Sending data");
    assert_eq!(server.handle.passive_ports_in_use(), 1);

    client.send("ABOR").await;
    assert_eq!(client.reply().await, "426 Connection closed; transfer aborted");
    assert_eq!(client.reply().await, "226 ABOR command successful");

    assert_eq!(client.cmd("PWD").await, "257 \"/\" is the current directory");
    server.wait_for_idle_ports().await;
}

/// Starts a download that is too big to fit in the socket buffers and reads its first bytes, so
/// the server is stuck writing to an established data connection.
async fn stalled_download(client: &mut Client) -> tokio::net::TcpStream {
    let data_addr = client.pasv().await;
    assert_eq!(client.cmd("RETR huge.bin").await, "150 Sending data");
    let mut stream = tokio::net::TcpStream::connect(data_addr).await.unwrap();
    let mut first = vec![0; 4096];
    stream.read_exact(&mut first).await.unwrap();
    stream
}

/// Reads what is left on the data connection. The server must have let go of it.
async fn drain_closed(mut stream: tokio::net::TcpStream) {
    let mut rest = vec![];
    let drained = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut rest)).await;
    assert!(drained.is_ok(), "data connection still open after the transfer was aborted");
}

#[tokio::test]
async fn abort_a_transfer_on_an_open_data_connection() {
    let server = common::start().await;
    std::fs::write(server.root.join("huge.bin"), vec![0u8; 32 * 1024 * 1024]).unwrap();

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;
    let stream = stalled_download(&mut client).await;

    client.send("ABOR").await;
    assert_eq!(client.reply().await, "426 Connection closed; transfer aborted");
    assert_eq!(client.reply().await, "226 ABOR command successful");
    drain_closed(stream).await;

    assert_eq!(client.cmd("PWD").await, "257 \"/\" is the current directory");
    server.wait_for_idle_ports().await;
}

#[tokio::test]
async fn user_during_a_transfer_closes_it_first() {
    let server = common::start().await;
    std::fs::write(server.root.join("huge.bin"), vec![0u8; 32 * 1024 * 1024]).unwrap();

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;
    let stream = stalled_download(&mut client).await;

    client.send("USER other").await;
    assert_eq!(client.reply().await, "426 Connection closed; transfer aborted");
    assert_eq!(client.reply().await, "331 Password Required");
    drain_closed(stream).await;

    assert_eq!(client.cmd("PASS other").await, "230 User logged in, proceed");
    assert_eq!(client.cmd("PWD").await, "257 \"/\" is the current directory");
    server.wait_for_idle_ports().await;
}

#[tokio::test]
async fn transfer_without_data_connection() {
    let server = common::start().await;
    std::fs::write(server.root.join("a.txt"), b"a").unwrap();

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;

    assert_eq!(client.cmd("RETR a.txt").await, "425 Use PORT or PASV first");
    assert_eq!(client.cmd("LIST").await, "425 Use PORT or PASV first");
}

#[tokio::test]
async fn unanswered_passive_connection_times_out() {
    let server = common::start_with(|root| common::anonymous(root).data_connect_timeout(Duration::from_millis(200))).await;
    std::fs::write(server.root.join("a.txt"), b"a").unwrap();

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;
    let _ = client.pasv().await;
    assert_eq!(client.cmd("RETR a.txt").await, "150 Sending data");
    assert_eq!(client.reply().await, "425 No data connection established");
    server.wait_for_idle_ports().await;
}

#[tokio::test]
async fn passive_ports_return_to_the_pool() {
    let server = common::start().await;
    assert_eq!(server.handle.passive_ports_in_use(), 0);

    let mut clients = vec![];
    let mut ports = HashSet::new();
    for _ in 0..3 {
        let mut client = Client::greeted(server.addr()).await;
        client.login("test", "test").await;
        ports.insert(client.pasv().await.port());
        clients.push(client);
    }
    assert_eq!(ports.len(), 3, "concurrent sessions share a passive port");
    assert_eq!(server.handle.passive_ports_in_use(), 3);

    // A second PASV replaces the first listener
    let _ = clients[0].pasv().await;
    assert_eq!(server.handle.passive_ports_in_use(), 3);

    for mut client in clients {
        assert_eq!(client.cmd("QUIT").await, "221 Bye!");
    }
    server.wait_for_idle_ports().await;
    server.wait_for_no_sessions().await;
}

#[tokio::test]
async fn session_limit() {
    let server = common::start_with(|root| common::anonymous(root).max_sessions(1)).await;

    let mut first = Client::greeted(server.addr()).await;
    let mut second = Client::connect(server.addr()).await;
    assert_eq!(second.reply().await, "421 Too many connections");
    assert!(second.is_closed().await);

    assert_eq!(first.cmd("QUIT").await, "221 Bye!");
    server.wait_for_no_sessions().await;
    let _third = Client::greeted(server.addr()).await;
}

#[tokio::test]
async fn idle_sessions_time_out() {
    let server = common::start_with(|root| common::anonymous(root).idle_session_timeout(Duration::from_millis(300))).await;
    let mut client = Client::greeted(server.addr()).await;
    assert_eq!(client.reply().await, "421 Session timed out. Closing control connection");
    assert!(client.is_closed().await);
}

#[tokio::test]
async fn quit_waits_for_the_transfer() {
    let server = common::start().await;
    let data = random_bytes(256 * 1024);

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;
    let data_addr = client.pasv().await;
    assert_eq!(client.cmd("STOR late.bin").await, "150 Ready to receive data");

    client.send("QUIT").await;
    upload(data_addr, &data).await;
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");
    assert_eq!(client.reply().await, "221 Bye!");
    assert!(client.is_closed().await);
    assert_eq!(std::fs::read(server.root.join("late.bin")).unwrap(), data);
}

#[tokio::test]
async fn shutdown_closes_idle_sessions() {
    let common::TestServer { handle, tempdir: _tempdir, .. } = common::start().await;
    let addr = handle.local_addr();
    let mut client = Client::greeted(addr).await;
    client.login("test", "test").await;

    handle.shutdown().await.unwrap();
    assert_eq!(client.reply().await, "421 Server is shutting down");
    assert!(client.is_closed().await);
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn shutdown_lets_running_transfers_finish() {
    let server = common::start().await;
    let root = server.root.clone();
    let data = random_bytes(128 * 1024);

    let mut client = Client::greeted(server.addr()).await;
    client.login("test", "test").await;
    let data_addr = client.pasv().await;
    assert_eq!(client.cmd("STOR during.bin").await, "150 Ready to receive data");

    let mut data_stream = tokio::net::TcpStream::connect(data_addr).await.unwrap();
    data_stream.write_all(&data[..1024]).await.unwrap();

    let common::TestServer { handle, tempdir: _tempdir, .. } = server;
    let shutdown = tokio::spawn(handle.shutdown());
    tokio::time::sleep(Duration::from_millis(100)).await;

    data_stream.write_all(&data[1024..]).await.unwrap();
    data_stream.shutdown().await.unwrap();
    assert_eq!(client.reply().await, "226 Closing data connection, transfer complete");
    assert_eq!(client.reply().await, "421 Server is shutting down");
    assert!(client.is_closed().await);

    shutdown.await.unwrap().unwrap();
    assert_eq!(std::fs::read(root.join("during.bin")).unwrap(), data);
}
