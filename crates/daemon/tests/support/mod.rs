//! A minimal in-memory-ish driver (backed by a real temp directory) used to
//! exercise [`daemon::Server`] end to end without a real deployment's
//! storage backend.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::SystemTime;

use async_trait::async_trait;
use core::context::ClientContext;
use core::driver::{Driver, FileSystem, TransferHandle};
use core::error::{DriverErrorKind, FtpError};
use core::metadata::{Fileinfo, Metadata, Permissions};
use core::settings::{ConnectionCheck, Settings, TlsRequirement, TransferType};
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

/// Built against a fresh temp directory; `USER anon` / `PASS anon` is the
/// only credential pair accepted.
pub struct TestDriver {
    settings: Settings,
    root: PathBuf,
}

impl TestDriver {
    pub fn new(root: PathBuf) -> Self {
        Self {
            settings: Settings {
                listen_addr: "127.0.0.1:0".parse().unwrap(),
                public_host: None,
                public_ip_resolver: None,
                passive_transfer_port_range: None,
                active_transfer_port_non_20: true,
                idle_timeout_secs: 5,
                connection_timeout_secs: 5,
                disable_mlsd: false,
                disable_mlst: false,
                disable_mfmt: false,
                disable_list_args: false,
                disable_site: false,
                disable_active_mode: false,
                disable_stat: false,
                disable_syst: false,
                enable_hash: true,
                enable_comb: true,
                banner: "test server ready".to_string(),
                tls_required: TlsRequirement::ClearOrEncrypted,
                default_transfer_type: TransferType::Binary,
                pasv_connections_check: ConnectionCheck::IpMatchDisabled,
                active_connections_check: ConnectionCheck::IpMatchDisabled,
            },
            root,
        }
    }
}

#[async_trait]
impl Driver for TestDriver {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    async fn client_connected(&self, _ctx: &ClientContext) -> Result<String, FtpError> {
        Ok("test server ready".to_string())
    }

    async fn client_disconnected(&self, _ctx: &ClientContext) {}

    async fn authenticate(
        &self,
        _ctx: &ClientContext,
        user: &str,
        pass: &str,
    ) -> Result<Box<dyn FileSystem>, FtpError> {
        if user == "anon" && pass == "anon" {
            Ok(Box::new(TestFileSystem { root: self.root.clone() }))
        } else {
            Err(FtpError::AuthenticationFailed)
        }
    }
}

struct TestFileSystem {
    root: PathBuf,
}

impl TestFileSystem {
    fn resolve(&self, path: &Path) -> PathBuf {
        let relative = path.strip_prefix("/").unwrap_or(path);
        self.root.join(relative)
    }
}

fn driver_err(kind: DriverErrorKind, op: &'static str, path: &Path, err: std::io::Error) -> FtpError {
    FtpError::driver(kind, op, path.to_path_buf(), err)
}

fn kind_for(err: &std::io::Error) -> DriverErrorKind {
    match err.kind() {
        std::io::ErrorKind::NotFound => DriverErrorKind::NotFound,
        std::io::ErrorKind::PermissionDenied => DriverErrorKind::PermissionDenied,
        _ => DriverErrorKind::LocalError,
    }
}

#[async_trait]
impl FileSystem for TestFileSystem {
    async fn stat(&self, path: &Path) -> Result<Box<dyn Metadata + Send>, FtpError> {
        let real = self.resolve(path);
        let meta = tokio::fs::metadata(&real)
            .await
            .map_err(|err| driver_err(kind_for(&err), "stat", path, err))?;
        Ok(Box::new(FileMetadata(meta)))
    }

    async fn list(&self, path: &Path) -> Result<Vec<Fileinfo<PathBuf, Box<dyn Metadata + Send>>>, FtpError> {
        let real = self.resolve(path);
        let mut read_dir = tokio::fs::read_dir(&real)
            .await
            .map_err(|err| driver_err(kind_for(&err), "list", path, err))?;
        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|err| driver_err(DriverErrorKind::LocalError, "list", path, err))?
        {
            let meta = entry
                .metadata()
                .await
                .map_err(|err| driver_err(DriverErrorKind::LocalError, "list", path, err))?;
            entries.push(Fileinfo {
                path: PathBuf::from(entry.file_name()),
                metadata: Box::new(FileMetadata(meta)) as Box<dyn Metadata + Send>,
            });
        }
        Ok(entries)
    }

    async fn open_read(&self, path: &Path) -> Result<Box<dyn TransferHandle>, FtpError> {
        let real = self.resolve(path);
        let file = tokio::fs::File::open(&real)
            .await
            .map_err(|err| driver_err(kind_for(&err), "open_read", path, err))?;
        Ok(Box::new(FileHandle(file)))
    }

    async fn open_write(&self, path: &Path, append: bool) -> Result<Box<dyn TransferHandle>, FtpError> {
        let real = self.resolve(path);
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&real)
            .await
            .map_err(|err| driver_err(kind_for(&err), "open_write", path, err))?;
        Ok(Box::new(FileHandle(file)))
    }

    async fn mkdir(&self, path: &Path) -> Result<(), FtpError> {
        let real = self.resolve(path);
        tokio::fs::create_dir(&real)
            .await
            .map_err(|err| driver_err(kind_for(&err), "mkdir", path, err))
    }

    async fn remove_file(&self, path: &Path) -> Result<(), FtpError> {
        let real = self.resolve(path);
        tokio::fs::remove_file(&real)
            .await
            .map_err(|err| driver_err(kind_for(&err), "remove_file", path, err))
    }

    async fn remove_dir(&self, path: &Path) -> Result<(), FtpError> {
        let real = self.resolve(path);
        tokio::fs::remove_dir(&real)
            .await
            .map_err(|err| driver_err(kind_for(&err), "remove_dir", path, err))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), FtpError> {
        let real_from = self.resolve(from);
        let real_to = self.resolve(to);
        tokio::fs::rename(&real_from, &real_to)
            .await
            .map_err(|err| driver_err(kind_for(&err), "rename", from, err))
    }

    async fn set_modified(&self, path: &Path, time: SystemTime) -> Result<(), FtpError> {
        let real = self.resolve(path);
        let time = filetime::FileTime::from_system_time(time);
        filetime::set_file_mtime(&real, time).map_err(|err| driver_err(DriverErrorKind::LocalError, "set_modified", path, err))
    }
}

struct FileMetadata(std::fs::Metadata);

impl Metadata for FileMetadata {
    fn len(&self) -> u64 {
        self.0.len()
    }

    fn is_file(&self) -> bool {
        self.0.is_file()
    }

    fn is_dir(&self) -> bool {
        self.0.is_dir()
    }

    fn is_symlink(&self) -> bool {
        self.0.file_type().is_symlink()
    }

    fn modified(&self) -> std::io::Result<SystemTime> {
        self.0.modified()
    }

    fn permissions(&self) -> Permissions {
        if self.0.is_dir() {
            Permissions { mode: 0o755 }
        } else {
            Permissions::READWRITE
        }
    }
}

struct FileHandle(tokio::fs::File);

impl AsyncRead for FileHandle {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl AsyncWrite for FileHandle {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.0).poll_shutdown(cx)
    }
}

impl TransferHandle for FileHandle {
    fn seek_from_start<'a>(
        &'a mut self,
        offset: u64,
    ) -> Pin<Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.0.seek(std::io::SeekFrom::Start(offset)).await?;
            Ok(())
        })
    }
}

/// Starts a [`daemon::Server`] against `root` on an ephemeral loopback port
/// and returns its bound address plus a [`daemon::ShutdownHandle`].
pub async fn spawn_server(root: PathBuf) -> (SocketAddr, daemon::ShutdownHandle) {
    let driver: Arc<dyn Driver> = Arc::new(TestDriver::new(root));
    let server = daemon::Server::bind(driver, None).await.expect("bind");
    let addr = server.local_addr().expect("local_addr");
    let shutdown = server.shutdown_handle();
    tokio::spawn(server.run());
    (addr, shutdown)
}

/// A thin line-oriented client over a plain `TcpStream`, for driving a
/// [`daemon::Server`] the way a real FTP client would.
pub struct Client {
    stream: tokio::io::BufStream<TcpStream>,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        Self { stream: tokio::io::BufStream::new(stream) }
    }

    /// Reads one reply, following `NNN-` continuation lines through to the
    /// closing `NNN ` line, and returns the full text including the code.
    pub async fn read_reply(&mut self) -> String {
        use tokio::io::AsyncBufReadExt;
        let mut full = String::new();
        loop {
            let mut line = String::new();
            let n = self.stream.read_line(&mut line).await.expect("read_line");
            assert!(n > 0, "connection closed while expecting a reply");
            full.push_str(&line);
            let bytes = line.as_bytes();
            if bytes.len() >= 4 && bytes[3] == b' ' {
                break;
            }
        }
        full
    }

    pub async fn send(&mut self, line: &str) {
        use tokio::io::AsyncWriteExt;
        self.stream.write_all(line.as_bytes()).await.expect("write");
        self.stream.write_all(b"\r\n").await.expect("write crlf");
        self.stream.flush().await.expect("flush");
    }

    /// Sends a command and returns its reply.
    pub async fn command(&mut self, line: &str) -> String {
        self.send(line).await;
        self.read_reply().await
    }

    pub async fn login(&mut self) {
        assert!(self.read_reply().await.starts_with("220"));
        assert!(self.command("USER anon").await.starts_with("331"));
        assert!(self.command("PASS anon").await.starts_with("230"));
    }

    /// Issues `PASV`, returning the port the server is listening on.
    pub async fn pasv_port(&mut self) -> u16 {
        let reply = self.command("PASV").await;
        parse_pasv_port(&reply).expect("parse PASV reply")
    }

    /// Reads until the peer closes the connection, asserting that happens
    /// (rather than hanging) within `timeout`.
    pub async fn expect_eof(&mut self, timeout: std::time::Duration) {
        use tokio::io::AsyncReadExt;
        tokio::time::timeout(timeout, async {
            let mut buf = [0u8; 8];
            loop {
                let n = self.stream.read(&mut buf).await.expect("read");
                if n == 0 {
                    break;
                }
            }
        })
        .await
        .expect("connection did not close within the expected timeout");
    }
}

fn parse_pasv_port(reply: &str) -> Option<u16> {
    let start = reply.find('(')?;
    let end = reply.find(')')?;
    let fields: Vec<&str> = reply[start + 1..end].split(',').collect();
    if fields.len() != 6 {
        return None;
    }
    let p1: u16 = fields[4].parse().ok()?;
    let p2: u16 = fields[5].parse().ok()?;
    Some(p1 * 256 + p2)
}
