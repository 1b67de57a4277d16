//! The per-connection state machine: one task per accepted control
//! connection, reading commands and dispatching them against a driver.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use core::driver::{Driver, FileSystem};
use core::error::FtpError;
use core::settings::{Settings, TlsRequirement, TransferType};
use core::status;
use tokio::io::{BufReader, ReadHalf};
use tokio::sync::{Mutex, Notify, Semaphore};
use tokio::time;
use tracing::{debug, info, warn};
use transport::{DataStream, TlsAcceptor, TlsProvider};

use crate::handlers;
use crate::state::TransferState;
use crate::writer::{ControlWriter, spawn_writer};

/// The generic handler-error reply code (§7): wraps any error a handler
/// returns rather than replying itself.
const HANDLER_ERROR: u16 = 500;

/// One live FTP session: its control-channel halves, the driver it is
/// authenticated against, and the bits of state RFC 959 commands mutate.
pub struct Connection {
    pub(crate) id: u32,
    pub(crate) local_addr: SocketAddr,
    pub(crate) remote_addr: SocketAddr,
    pub(crate) reader: BufReader<ReadHalf<Box<dyn DataStream>>>,
    pub(crate) writer: ControlWriter,
    pub(crate) driver: Arc<dyn Driver>,
    pub(crate) tls_provider: Option<Arc<dyn TlsProvider>>,
    pub(crate) filesystem: Option<Arc<dyn FileSystem>>,
    pub(crate) control_tls: bool,
    pub(crate) transfer_tls: bool,
    pub(crate) authenticated: bool,
    pub(crate) pending_user: Option<String>,
    pub(crate) current_path: String,
    pub(crate) rename_from: Option<PathBuf>,
    pub(crate) rest_offset: u64,
    pub(crate) transfer_type: TransferType,
    pub(crate) hash_algorithm: String,
    pub(crate) client_version: Option<String>,
    pub(crate) transfer: Arc<Mutex<TransferState>>,
    pub(crate) transfer_gate: Arc<Semaphore>,
    pub(crate) abort_notify: Arc<Notify>,
}

impl Connection {
    /// Builds a connection over an already-accepted (and, for implicit TLS,
    /// already-wrapped) stream.
    #[must_use]
    pub fn new(
        id: u32,
        local_addr: SocketAddr,
        remote_addr: SocketAddr,
        stream: Box<dyn DataStream>,
        driver: Arc<dyn Driver>,
        tls_provider: Option<Arc<dyn TlsProvider>>,
        control_tls: bool,
    ) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        let default_type = driver.settings().default_transfer_type;
        Self {
            id,
            local_addr,
            remote_addr,
            reader: BufReader::new(read_half),
            writer: spawn_writer(write_half),
            driver,
            tls_provider,
            filesystem: None,
            control_tls,
            transfer_tls: false,
            authenticated: false,
            pending_user: None,
            current_path: "/".to_string(),
            rename_from: None,
            rest_offset: 0,
            transfer_type: default_type,
            hash_algorithm: "SHA-256".to_string(),
            client_version: None,
            transfer: Arc::new(Mutex::new(TransferState::default())),
            transfer_gate: Arc::new(Semaphore::new(1)),
            abort_notify: Arc::new(Notify::new()),
        }
    }

    /// The connection's unique client ID.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// The remote peer's address.
    #[must_use]
    pub const fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// The settings this connection's server was configured with.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        self.driver.settings()
    }

    /// Resolves `param` against the current working directory.
    #[must_use]
    pub fn abs_path(&self, param: &str) -> PathBuf {
        crate::path::abs_path(&self.current_path, param)
    }

    /// Runs the command loop to completion: greeting, read/dispatch until
    /// EOF, idle timeout, or `QUIT`, then the driver's disconnect hook.
    pub async fn run(mut self) {
        match self.driver.client_connected(&self.driver_context()).await {
            Ok(greeting) => {
                self.writer.reply(status::SERVICE_READY, greeting).await;
            }
            Err(err) => {
                self.writer
                    .reply(status::SERVICE_NOT_AVAILABLE, err.wire_message())
                    .await;
                return;
            }
        }

        let idle_timeout = Duration::from_secs(u64::from(self.driver.settings().idle_timeout()));

        loop {
            // The idle timeout only guards a reader with nothing else to wait
            // for; while a transfer task is holding the data connection open,
            // a read deadline here would tear down the control channel out
            // from under a transfer that is still making progress.
            let transfer_open = self.transfer.lock().await.is_open;
            let read_outcome = if transfer_open {
                Ok(protocol::read_command_line(&mut self.reader).await)
            } else {
                time::timeout(idle_timeout, protocol::read_command_line(&mut self.reader)).await
            };

            let line = match read_outcome {
                Ok(Ok(Some(line))) => line,
                Ok(Ok(None)) => {
                    debug!(client_id = self.id, "control connection closed by peer");
                    break;
                }
                Ok(Err(err)) if err.kind() == io::ErrorKind::InvalidData => {
                    self.writer
                        .reply(status::SYNTAX_ERROR_COMMAND, "Command line too long")
                        .await;
                    continue;
                }
                Ok(Err(err)) => {
                    warn!(client_id = self.id, %err, "control channel read failed");
                    break;
                }
                Err(_) => {
                    self.writer
                        .reply(
                            status::SERVICE_NOT_AVAILABLE,
                            "command timeout: closing control connection",
                        )
                        .await;
                    break;
                }
            };

            let resolved_name = resolve_special_action_suffix(&line.command);
            let descriptor = match protocol::lookup(&resolved_name) {
                Some(descriptor) => descriptor,
                None => {
                    self.writer
                        .reply(status::SYNTAX_ERROR_COMMAND, "Unknown command")
                        .await;
                    continue;
                }
            };

            if !self.authenticated && !descriptor.open_to_unauth {
                self.writer
                    .reply(status::NOT_LOGGED_IN, "Please login with USER and PASS")
                    .await;
                continue;
            }

            if descriptor.name == "USER"
                && matches!(self.driver.settings().tls_required, TlsRequirement::MandatoryEncryption)
                && !self.control_tls
            {
                self.writer
                    .reply(status::SERVICE_NOT_AVAILABLE, "TLS is required")
                    .await;
                break;
            }

            // STAT is special-action only when bare; with a parameter it's a
            // normal file-inquiry command and must wait like any other.
            let is_special = descriptor.special_action
                && !(descriptor.name == "STAT" && !line.param.trim().is_empty());

            if descriptor.name == "AUTH" && line.param.eq_ignore_ascii_case("TLS") {
                if self.tls_provider.is_some() {
                    self.writer.reply(status::AUTH_OK, "AUTH TLS OK").await;
                    match self.upgrade_to_tls().await {
                        Some(upgraded) => self = upgraded,
                        None => {
                            warn!(client_id = self.id, "TLS handshake failed during AUTH TLS");
                            break;
                        }
                    }
                } else {
                    self.writer
                        .reply(
                            status::COMMAND_NOT_IMPLEMENTED_FOR_PARAMETER,
                            "TLS is not available",
                        )
                        .await;
                }
                continue;
            }

            if descriptor.name == "QUIT" {
                // Waits for any in-flight transfer to finish naturally before
                // replying, rather than racing it.
                let _permit = self.transfer_gate.acquire().await;
                let message = handlers::misc::quit_message(&self).await;
                self.writer.reply(status::SERVICE_CLOSING, message).await;
                break;
            }

            if is_special {
                let result = match descriptor.name {
                    "ABOR" => handlers::misc::abor(&mut self).await,
                    "STAT" => handlers::misc::stat_status(&mut self).await,
                    _ => unreachable!("special-action set is {{ABOR, STAT, QUIT}}"),
                };
                if let Err(err) = result {
                    self.writer.reply(HANDLER_ERROR, format!("Error: {err}")).await;
                }
                continue;
            }

            if descriptor.transfer_related {
                self.spawn_transfer(descriptor.name, line.param).await;
                continue;
            }

            let _permit = self.transfer_gate.acquire().await;
            let result = handlers::dispatch(&mut self, descriptor.name, &line.param).await;
            drop(_permit);
            if let Err(err) = result {
                self.writer.reply(HANDLER_ERROR, format!("Error: {err}")).await;
            }
        }

        self.driver.client_disconnected(&self.driver_context()).await;
        info!(client_id = self.id, "connection closed");
    }

    /// Spawns the second, transfer-executing task §5 describes: takes the
    /// installed data-channel handler out of the shared slot, holds the
    /// transfer gate for the task's lifetime, and runs the copy loop without
    /// blocking the command reader.
    async fn spawn_transfer(&mut self, command: &'static str, param: String) {
        let Ok(permit) = self.transfer_gate.clone().acquire_owned().await else {
            return;
        };

        let handler = {
            let mut state = self.transfer.lock().await;
            state.is_aborted = false;
            state.handler.take()
        };
        let Some(handler) = handler else {
            self.writer
                .reply(
                    status::CANT_OPEN_DATA_CONNECTION,
                    "unable to open transfer: no transfer connection",
                )
                .await;
            return;
        };

        let Some(filesystem) = self.filesystem.clone() else {
            self.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
            return;
        };

        let path = self.abs_path(&param);
        let job = handlers::transfer::TransferJob {
            command,
            param,
            path,
            current_path: self.current_path.clone(),
            disable_list_args: self.driver.settings().disable_list_args,
            rest_offset: std::mem::take(&mut self.rest_offset),
            transfer_type: self.transfer_type,
            handler,
            filesystem,
            writer: self.writer.clone(),
            transfer_state: self.transfer.clone(),
            abort_notify: self.abort_notify.clone(),
            tls_mandatory: matches!(self.driver.settings().tls_required, TlsRequirement::MandatoryEncryption),
            transfer_tls: self.transfer_tls,
        };

        tokio::spawn(async move {
            let _permit = permit;
            handlers::transfer::run(job).await;
        });
    }

    async fn upgrade_to_tls(mut self) -> Option<Self> {
        let provider = self.tls_provider.clone()?;
        let write_half = self.writer.take_half().await?;
        let read_half = self.reader.into_inner();
        let joined = tokio::io::join(read_half, write_half);

        let acceptor = TlsAcceptor::new(provider.server_config());
        let tls_stream: Box<dyn DataStream> = acceptor.accept(joined).await.ok()?;
        let (new_read, new_write) = tokio::io::split(tls_stream);

        self.reader = BufReader::new(new_read);
        self.writer = spawn_writer(new_write);
        self.control_tls = true;
        Some(self)
    }

    pub(crate) fn driver_context(&self) -> core::context::ClientContext {
        let tls_requirement = self.driver.settings().tls_required;
        let mut ctx = core::context::ClientContext::new(self.id, self.local_addr, self.remote_addr, tls_requirement);
        ctx.set_current_path(self.current_path.clone());
        ctx.set_control_tls(self.control_tls);
        ctx.set_transfer_tls(self.transfer_tls);
        if let Some(version) = &self.client_version {
            ctx.set_client_version(version.clone());
        }
        ctx
    }
}

/// Best-effort Telnet-IP/Synch accommodation (§4.3 point 2): if the raw
/// command verb isn't recognized, check whether it *ends with* one of the
/// special-action names and, if so, dispatch against that suffix instead.
fn resolve_special_action_suffix(command: &str) -> String {
    if protocol::lookup(command).is_some() {
        return command.to_string();
    }
    for name in ["ABOR", "STAT", "QUIT"] {
        if command.ends_with(name) {
            return name.to_string();
        }
    }
    command.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_command_passes_through_unchanged() {
        assert_eq!(resolve_special_action_suffix("ABOR"), "ABOR");
    }

    #[test]
    fn telnet_prefixed_abor_resolves_to_the_suffix() {
        assert_eq!(resolve_special_action_suffix("\u{00f4}\u{00ff}\u{00f4}ABOR"), "ABOR");
    }

    #[test]
    fn unrelated_unknown_command_is_unchanged() {
        assert_eq!(resolve_special_action_suffix("BOGUS"), "BOGUS");
    }
}
