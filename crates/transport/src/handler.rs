//! The handler abstraction both active and passive data connections satisfy.

use async_trait::async_trait;
use core::error::FtpError;
use tokio::io::{AsyncRead, AsyncWrite};

/// A data-connection byte stream, plain or TLS-wrapped.
pub trait DataStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> DataStream for T {}

/// One data connection's lifecycle: established lazily on first [`Self::open`],
/// torn down by [`Self::close`]. A single instance is installed per control
/// connection per `PASV`/`EPSV`/`PORT`/`EPRT` and reused across one transfer.
#[async_trait]
pub trait TransferHandler: Send {
    /// Establishes the underlying connection if it isn't already open,
    /// applying TLS if the handler was configured to require it.
    async fn open(&mut self) -> Result<Box<dyn DataStream>, FtpError>;

    /// Closes the connection, if one was opened. Idempotent.
    async fn close(&mut self) -> Result<(), FtpError>;

    /// Human-readable description of the connection for `STAT`-style
    /// reporting, e.g. `"passive (34512)"` or `"active (203.0.113.5:4021)"`.
    fn info(&self) -> &str;

    /// Whether this connection is protected by TLS.
    fn is_tls(&self) -> bool;
}
