//! TLS wrapping for both the control channel (`AUTH TLS`/implicit TLS) and
//! data channels (`PROT P`).
//!
//! This server always plays the TLS server role, even on an active-mode
//! data connection it dialed out to a client-specified address: the
//! certificate and key live with the host, not with whichever side opened
//! the TCP socket.

use std::sync::Arc;

use core::error::FtpError;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::{TlsAcceptor as RustlsAcceptor, server::TlsStream};

use crate::handler::DataStream;

/// Driver capability exposing the TLS materials this server presents.
///
/// A host implements this alongside [`core::driver::Driver`] when any
/// [`core::settings::TlsRequirement`] other than never is in force, and
/// passes both to the server constructor; `core` has no dependency on
/// `transport`, so this can't live as a method on `Driver` itself.
pub trait TlsProvider: Send + Sync {
    /// The `rustls` server configuration (certificate chain, private key,
    /// ALPN, etc.) used for every control and data channel upgrade.
    fn server_config(&self) -> Arc<ServerConfig>;
}

/// A reusable TLS wrapper built once from a [`TlsProvider`] and applied to
/// as many connections as the session needs (the control channel once, each
/// data channel once per transfer).
#[derive(Clone)]
pub struct TlsAcceptor {
    inner: RustlsAcceptor,
}

impl TlsAcceptor {
    /// Builds an acceptor from the driver-supplied server configuration.
    #[must_use]
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            inner: RustlsAcceptor::from(config),
        }
    }

    /// Performs the TLS server handshake over `stream`, returning a
    /// [`DataStream`] that transparently encrypts/decrypts from here on.
    pub async fn accept<S>(&self, stream: S) -> Result<Box<dyn DataStream>, FtpError>
    where
        S: DataStream + 'static,
    {
        let tls_stream: TlsStream<S> = self
            .inner
            .accept(stream)
            .await
            .map_err(|err| FtpError::Tls(err.to_string()))?;
        Ok(Box::new(tls_stream))
    }
}
