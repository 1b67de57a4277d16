//! The listening acceptor: binds the control port, spawns one [`Connection`]
//! task per accepted client, and tracks the live set for graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use core::driver::Driver;
use dashmap::DashMap;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, warn};
use transport::{DataStream, TlsAcceptor, TlsProvider};

use crate::connection::Connection;

/// The minimum backoff after a transient `accept` error, doubled on each
/// consecutive failure up to [`MAX_ACCEPT_BACKOFF`].
const MIN_ACCEPT_BACKOFF: Duration = Duration::from_millis(5);
/// The backoff ceiling; a listener that keeps failing this often is almost
/// certainly out of file descriptors, not having a bad day.
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// The running server: an accept loop plus the registry of connections it
/// has spawned.
pub struct Server {
    listener: TcpListener,
    driver: Arc<dyn Driver>,
    tls_provider: Option<Arc<dyn TlsProvider>>,
    next_client_id: AtomicU32,
    clients: Arc<DashMap<u32, JoinHandle<()>>>,
    shutdown: Arc<Notify>,
}

impl Server {
    /// Binds `driver.settings().listen_addr` and returns a server ready to
    /// [`run`](Self::run). `tls_provider` supplies the certificate material
    /// for implicit TLS and `AUTH TLS`/`PROT P` upgrades; pass `None` if
    /// `driver.settings().tls_required` is never anything but
    /// [`core::settings::TlsRequirement::ClearOrEncrypted`] without data- or
    /// control-channel encryption ever being offered.
    pub async fn bind(
        driver: Arc<dyn Driver>,
        tls_provider: Option<Arc<dyn TlsProvider>>,
    ) -> std::io::Result<Self> {
        let addr = driver.settings().listen_addr;
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "listening");
        Ok(Self {
            listener,
            driver,
            tls_provider,
            next_client_id: AtomicU32::new(1),
            clients: Arc::new(DashMap::new()),
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// The address the listener actually bound to (useful when the
    /// configured port was `0`).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle that, when [`shutdown`](Self::shutdown) is called on it,
    /// stops [`run`](Self::run) from accepting further connections. Existing
    /// connections are left to finish on their own.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            notify: self.shutdown.clone(),
        }
    }

    /// Runs the accept loop until [`ShutdownHandle::shutdown`] is called,
    /// then waits for every spawned connection task to finish.
    pub async fn run(self) {
        let mut backoff = MIN_ACCEPT_BACKOFF;
        loop {
            tokio::select! {
                biased;
                () = self.shutdown.notified() => {
                    info!("shutdown requested, no longer accepting new connections");
                    break;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, remote_addr)) => {
                            backoff = MIN_ACCEPT_BACKOFF;
                            self.spawn_connection(stream, remote_addr);
                        }
                        Err(err) if is_transient(&err) => {
                            warn!(%err, delay_ms = backoff.as_millis() as u64, "transient accept error, backing off");
                            tokio::time::sleep(backoff).await;
                            backoff = (backoff * 2).min(MAX_ACCEPT_BACKOFF);
                        }
                        Err(err) => {
                            error!(%err, "fatal accept error, stopping listener");
                            break;
                        }
                    }
                }
            }
        }

        self.wait_for_clients().await;
    }

    async fn wait_for_clients(&self) {
        loop {
            let handle = self.clients.iter().next().map(|entry| *entry.key());
            let Some(id) = handle else { break };
            if let Some((_, join)) = self.clients.remove(&id) {
                let _ = join.await;
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, remote_addr: SocketAddr) {
        let Ok(local_addr) = stream.local_addr() else {
            warn!(%remote_addr, "accepted connection with no local address, dropping");
            return;
        };
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let driver = self.driver.clone();
        let tls_provider = self.tls_provider.clone();
        let implicit_tls = matches!(
            driver.settings().tls_required,
            core::settings::TlsRequirement::ImplicitEncryption
        );
        let clients = self.clients.clone();
        let span = logging::connection_span(id, remote_addr);

        let handle = tokio::spawn(
            async move {
                let stream: Box<dyn DataStream> = Box::new(stream);
                let (stream, control_tls) = if implicit_tls {
                    match upgrade_implicit(stream, tls_provider.as_deref()).await {
                        Some(tls_stream) => (tls_stream, true),
                        None => {
                            warn!(client_id = id, %remote_addr, "implicit TLS handshake failed, dropping connection");
                            clients.remove(&id);
                            return;
                        }
                    }
                } else {
                    (stream, false)
                };

                let connection = Connection::new(id, local_addr, remote_addr, stream, driver, tls_provider, control_tls);
                connection.run().await;
                clients.remove(&id);
            }
            .instrument(span),
        );

        self.clients.insert(id, handle);
    }
}

async fn upgrade_implicit(
    stream: Box<dyn DataStream>,
    tls_provider: Option<&dyn TlsProvider>,
) -> Option<Box<dyn DataStream>> {
    let provider = tls_provider?;
    let acceptor = TlsAcceptor::new(provider.server_config());
    acceptor.accept(stream).await.ok()
}

/// Lets a caller stop a [`Server::run`] loop from the outside (e.g. on
/// `SIGTERM`).
#[derive(Clone)]
pub struct ShutdownHandle {
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    /// Signals the accept loop to stop taking new connections.
    pub fn shutdown(&self) {
        self.notify.notify_one();
    }
}

/// `accept()` errors worth retrying after a backoff rather than tearing the
/// whole listener down: the usual suspects are a process-wide fd limit
/// (`EMFILE`/`ENFILE`, surfaced as `Other` by `std`) or a peer that reset the
/// connection between the `listen` backlog and `accept`.
fn is_transient(err: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        err.kind(),
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::Interrupted | ErrorKind::Other
    )
}
