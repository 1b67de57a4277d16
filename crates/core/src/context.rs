//! The context object passed to driver callbacks.

use std::any::Any;
use std::collections::HashMap;
use std::net::SocketAddr;

use crate::settings::TlsRequirement;

/// Opaque per-connection storage a driver can use to stash its own state
/// across calls, keyed by a string the driver chooses.
#[derive(Default)]
pub struct Extra {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Extra {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value under `key`, returning the previous value if any.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Retrieves a value previously stored under `key`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref())
    }
}

/// Read-only and mutable connection state exposed to driver callbacks.
///
/// This mirrors §6's "host-facing context": connection identity, addressing,
/// the current path, debug/version bookkeeping, and the per-connection TLS
/// flags, plus opaque storage a driver can use for its own bookkeeping.
pub struct ClientContext {
    id: u32,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
    current_path: String,
    debug: bool,
    last_command: Option<String>,
    client_version: Option<String>,
    control_tls: bool,
    transfer_tls: bool,
    tls_requirement: TlsRequirement,
    extra: Extra,
}

impl ClientContext {
    /// Creates a new context for a just-accepted connection.
    #[must_use]
    pub fn new(
        id: u32,
        local_addr: SocketAddr,
        remote_addr: SocketAddr,
        tls_requirement: TlsRequirement,
    ) -> Self {
        Self {
            id,
            local_addr,
            remote_addr,
            current_path: "/".to_string(),
            debug: false,
            last_command: None,
            client_version: None,
            control_tls: matches!(tls_requirement, TlsRequirement::ImplicitEncryption),
            transfer_tls: false,
            tls_requirement,
            extra: Extra::new(),
        }
    }

    /// The connection's unique client ID.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// The local address the control connection was accepted on.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The remote peer's address.
    #[must_use]
    pub const fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// The current working directory, as an absolute FTP path.
    #[must_use]
    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// Sets the current working directory.
    pub fn set_current_path(&mut self, path: impl Into<String>) {
        self.current_path = path.into();
    }

    /// Whether verbose per-command debug logging is enabled.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Enables or disables verbose per-command debug logging.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// The name of the last command dispatched on this connection.
    #[must_use]
    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    /// Records the name of the command currently being dispatched.
    pub fn set_last_command(&mut self, command: impl Into<String>) {
        self.last_command = Some(command.into());
    }

    /// The client-advertised version string, set via `CLNT`.
    #[must_use]
    pub fn client_version(&self) -> Option<&str> {
        self.client_version.as_deref()
    }

    /// Records the client-advertised version string.
    pub fn set_client_version(&mut self, version: impl Into<String>) {
        self.client_version = Some(version.into());
    }

    /// Whether the control channel is currently TLS-protected.
    #[must_use]
    pub const fn control_tls(&self) -> bool {
        self.control_tls
    }

    /// Marks the control channel as TLS-protected after a successful
    /// `AUTH TLS` handshake (or immediately, for implicit TLS).
    pub fn set_control_tls(&mut self, protected: bool) {
        self.control_tls = protected;
    }

    /// Whether data connections are currently TLS-protected (`PROT P`).
    #[must_use]
    pub const fn transfer_tls(&self) -> bool {
        self.transfer_tls
    }

    /// Sets whether data connections are TLS-protected.
    pub fn set_transfer_tls(&mut self, protected: bool) {
        self.transfer_tls = protected;
    }

    /// The server-wide TLS requirement policy in force for this connection.
    #[must_use]
    pub const fn tls_requirement(&self) -> TlsRequirement {
        self.tls_requirement
    }

    /// Overrides the TLS requirement for this connection only, e.g. after a
    /// driver's per-client policy callback runs.
    pub fn set_tls_requirement(&mut self, requirement: TlsRequirement) {
        self.tls_requirement = requirement;
    }

    /// Opaque driver-owned storage.
    #[must_use]
    pub fn extra(&self) -> &Extra {
        &self.extra
    }

    /// Mutable access to opaque driver-owned storage.
    pub fn extra_mut(&mut self) -> &mut Extra {
        &mut self.extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:2121".parse().unwrap()
    }

    #[test]
    fn new_context_starts_at_root() {
        let ctx = ClientContext::new(1, addr(), addr(), TlsRequirement::ClearOrEncrypted);
        assert_eq!(ctx.current_path(), "/");
        assert!(!ctx.control_tls());
    }

    #[test]
    fn implicit_tls_starts_protected() {
        let ctx = ClientContext::new(1, addr(), addr(), TlsRequirement::ImplicitEncryption);
        assert!(ctx.control_tls());
    }

    #[test]
    fn extra_round_trips_typed_values() {
        let mut ctx = ClientContext::new(1, addr(), addr(), TlsRequirement::ClearOrEncrypted);
        ctx.extra_mut().insert("hits", 7_u32);
        assert_eq!(ctx.extra().get::<u32>("hits"), Some(&7));
        assert_eq!(ctx.extra().get::<String>("hits"), None);
    }
}
