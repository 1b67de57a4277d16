//! `PASV`/`EPSV` (passive mode): the client dials a listener we bind.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use core::error::FtpError;
use core::settings::ConnectionCheck;
use tokio::net::TcpListener;
use tokio::time;
use tracing::{debug, instrument, warn};

use crate::handler::{DataStream, TransferHandler};
use crate::tls::TlsAcceptor;

/// A composed passive-mode data connection: a pre-bound listener, accepted
/// from lazily on the first [`TransferHandler::open`].
pub struct PassiveTransferHandler {
    listener: Option<TcpListener>,
    connection_timeout: Duration,
    peer_check: ConnectionCheck,
    expected_peer_ip: IpAddr,
    tls: Option<TlsAcceptor>,
    stream: Option<Box<dyn DataStream>>,
    info: String,
}

impl PassiveTransferHandler {
    /// Wraps an already-bound `listener` (the caller picked the port, per
    /// the passive port-range allocator) into a handler that will accept
    /// exactly one connection.
    #[must_use]
    pub fn new(
        listener: TcpListener,
        connection_timeout: Duration,
        peer_check: ConnectionCheck,
        expected_peer_ip: IpAddr,
        tls: Option<TlsAcceptor>,
    ) -> Self {
        let port = listener
            .local_addr()
            .map(|addr| addr.port())
            .unwrap_or_default();
        let info = format!("passive ({port})");
        Self {
            listener: Some(listener),
            connection_timeout,
            peer_check,
            expected_peer_ip,
            tls,
            stream: None,
            info,
        }
    }

    /// The bound port clients should dial, before the listener is consumed
    /// by [`TransferHandler::open`].
    #[must_use]
    pub fn local_port(&self) -> Option<u16> {
        self.listener
            .as_ref()
            .and_then(|listener| listener.local_addr().ok())
            .map(|addr| addr.port())
    }
}

#[async_trait]
impl TransferHandler for PassiveTransferHandler {
    #[instrument(skip(self))]
    async fn open(&mut self) -> Result<Box<dyn DataStream>, FtpError> {
        if self.stream.is_none() {
            let listener = self
                .listener
                .take()
                .ok_or(FtpError::NoTransferConnection)?;

            let (tcp, peer_addr) = time::timeout(self.connection_timeout, listener.accept())
                .await
                .map_err(|_| {
                    FtpError::Io(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "timed out waiting for passive-mode data connection",
                    ))
                })?
                .map_err(FtpError::Io)?;

            if matches!(self.peer_check, ConnectionCheck::IpMatchRequired)
                && peer_addr.ip() != self.expected_peer_ip
            {
                warn!(peer = %peer_addr, expected = %self.expected_peer_ip, "rejecting passive data connection from unexpected peer");
                drop(tcp);
                return Err(FtpError::DataConnectionSecurity);
            }

            debug!(peer = %peer_addr, "passive data connection accepted");
            let wrapped: Box<dyn DataStream> = match &self.tls {
                Some(acceptor) => acceptor.accept(tcp).await?,
                None => Box::new(tcp),
            };
            self.stream = Some(wrapped);
        }
        self.stream.take().ok_or(FtpError::NoTransferConnection)
    }

    async fn close(&mut self) -> Result<(), FtpError> {
        self.listener = None;
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

    #[tokio::test]
    async fn rejects_unexpected_peer_under_ip_match_required() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut handler = PassiveTransferHandler::new(
            listener,
            Duration::from_secs(1),
            ConnectionCheck::IpMatchRequired,
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            None,
        );

        let connector = tokio::spawn(async move {
            tokio::net::TcpStream::connect((Ipv4Addr::LOCALHOST, port))
                .await
                .unwrap()
        });

        let result = handler.open().await;
        assert!(matches!(result, Err(FtpError::DataConnectionSecurity)));
        connector.await.unwrap();
    }

    #[tokio::test]
    async fn accepts_matching_peer() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut handler = PassiveTransferHandler::new(
            listener,
            Duration::from_secs(1),
            ConnectionCheck::IpMatchRequired,
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            None,
        );

        let connector = tokio::spawn(async move {
            tokio::net::TcpStream::connect((Ipv4Addr::LOCALHOST, port))
                .await
                .unwrap()
        });

        let result = handler.open().await;
        assert!(result.is_ok());
        connector.await.unwrap();
    }
}
