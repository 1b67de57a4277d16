//! `PORT`/`EPRT` (active mode): the server dials the client.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use core::error::FtpError;
use socket2::{Domain, Socket, Type};
use tokio::net::TcpStream;
use tokio::time;
use tracing::{debug, instrument};

use crate::handler::{DataStream, TransferHandler};
use crate::tls::TlsAcceptor;

/// A composed active-mode data connection: remote address plus dialer
/// settings, established lazily on the first [`TransferHandler::open`].
pub struct ActiveTransferHandler {
    remote_addr: SocketAddr,
    connection_timeout: Duration,
    active_transfer_port_non_20: bool,
    tls: Option<TlsAcceptor>,
    stream: Option<Box<dyn DataStream>>,
    info: String,
}

impl ActiveTransferHandler {
    /// Creates a handler that will dial `remote_addr` on first `open`.
    ///
    /// Unless `active_transfer_port_non_20` is set, the local side binds to
    /// port 20 with `SO_REUSEADDR`/`SO_REUSEPORT` so a burst of active
    /// transfers from the well-known ftp-data port doesn't collide on
    /// `TIME_WAIT`.
    #[must_use]
    pub fn new(
        remote_addr: SocketAddr,
        connection_timeout: Duration,
        active_transfer_port_non_20: bool,
        tls: Option<TlsAcceptor>,
    ) -> Self {
        let info = format!("active ({remote_addr})");
        Self {
            remote_addr,
            connection_timeout,
            active_transfer_port_non_20,
            tls,
            stream: None,
            info,
        }
    }

    fn local_bind_addr(&self) -> SocketAddr {
        let ip = match self.remote_addr {
            SocketAddr::V4(_) => std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            SocketAddr::V6(_) => std::net::IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED),
        };
        let port = if self.active_transfer_port_non_20 {
            0
        } else {
            20
        };
        SocketAddr::new(ip, port)
    }

    async fn dial(&self) -> Result<TcpStream, FtpError> {
        let domain = match self.remote_addr {
            SocketAddr::V4(_) => Domain::IPV4,
            SocketAddr::V6(_) => Domain::IPV6,
        };
        let socket = Socket::new(domain, Type::STREAM, None).map_err(FtpError::Io)?;
        socket.set_reuse_address(true).map_err(FtpError::Io)?;
        #[cfg(unix)]
        socket.set_reuse_port(true).map_err(FtpError::Io)?;

        socket
            .bind(&self.local_bind_addr().into())
            .map_err(FtpError::Io)?;
        socket.set_nonblocking(true).map_err(FtpError::Io)?;

        // A nonblocking connect returns immediately with `WouldBlock`
        // (EINPROGRESS); the real outcome is observed below via `writable()`
        // plus `take_error()`, so any error here is deliberately ignored.
        let _ = socket.connect(&self.remote_addr.into());

        let stream = TcpStream::from_std(socket.into()).map_err(FtpError::Io)?;

        time::timeout(self.connection_timeout, stream.writable())
            .await
            .map_err(|_| {
                FtpError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "timed out dialing active-mode data connection",
                ))
            })?
            .map_err(FtpError::Io)?;

        if let Some(err) = stream.take_error().map_err(FtpError::Io)? {
            return Err(FtpError::Io(err));
        }
        Ok(stream)
    }
}

#[async_trait]
impl TransferHandler for ActiveTransferHandler {
    #[instrument(skip(self), fields(remote = %self.remote_addr))]
    async fn open(&mut self) -> Result<Box<dyn DataStream>, FtpError> {
        if self.stream.is_none() {
            let tcp = self.dial().await?;
            debug!("active data connection established");
            let wrapped: Box<dyn DataStream> = match &self.tls {
                Some(acceptor) => acceptor.accept(tcp).await?,
                None => Box::new(tcp),
            };
            self.stream = Some(wrapped);
        }
        self.stream.take().ok_or(FtpError::NoTransferConnection)
    }

    async fn close(&mut self) -> Result<(), FtpError> {
        self.stream = None;
        Ok(())
    }

    fn info(&self) -> &str {
        &self.info
    }

    fn is_tls(&self) -> bool {
        self.tls.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn handler(active_transfer_port_non_20: bool) -> ActiveTransferHandler {
        ActiveTransferHandler::new(
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)), 4021),
            Duration::from_secs(1),
            active_transfer_port_non_20,
            None,
        )
    }

    #[test]
    fn info_describes_the_remote_endpoint() {
        assert_eq!(handler(false).info(), "active (203.0.113.5:4021)");
    }

    #[test]
    fn default_binds_local_side_to_port_20() {
        assert_eq!(handler(false).local_bind_addr().port(), 20);
    }

    #[test]
    fn non_20_setting_uses_an_ephemeral_local_port() {
        assert_eq!(handler(true).local_bind_addr().port(), 0);
    }
}
