//! Typed error surface shared by every crate in this workspace.
//!
//! [`FtpError`] is the single error type the control-channel dispatch loop
//! converts into a wire reply (see `core::status`). Driver implementations
//! report filesystem failures through [`DriverErrorKind`] rather than raw
//! `io::Error` so the core can classify them into an FTP reply code without
//! inspecting platform-specific error internals.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Classification of a driver-reported filesystem failure.
///
/// The core never inspects a driver's underlying error type; drivers
/// classify their own failures into one of these kinds so `core::status`
/// can map them onto an FTP reply code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DriverErrorKind {
    /// The operation would exceed a quota enforced by the driver.
    QuotaExceeded,
    /// The requested filename is rejected by driver policy.
    FilenameNotAllowed,
    /// The driver denied the operation for lack of permission.
    PermissionDenied,
    /// The requested path does not exist.
    NotFound,
    /// A driver-local failure not covered by the other kinds.
    LocalError,
    /// The driver does not understand the requested page/structure type.
    PageTypeUnknown,
}

/// Error surface returned by control-channel and data-channel operations.
#[derive(Debug, Error)]
pub enum FtpError {
    /// The client sent a command line that could not be parsed.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The client is not authenticated and the command requires it.
    #[error("not logged in")]
    NotAuthenticated,

    /// `USER`/`PASS` failed driver-side authentication.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// `Settings::validate` rejected the configuration.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A driver call failed; `operation` and `path` give wire-safe context.
    #[error("{operation} failed for {path}: {source}")]
    Driver {
        /// Classification used to pick an FTP reply code.
        kind: DriverErrorKind,
        /// Name of the operation the driver was asked to perform.
        operation: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// The driver's own error, never rendered directly to the wire.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// TLS handshake or configuration failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// No data connection is available for a transfer-related command.
    #[error("no transfer connection")]
    NoTransferConnection,

    /// The data connection's peer address failed a security check.
    #[error("data connection security requirements not met")]
    DataConnectionSecurity,

    /// TLS is required by policy but the relevant channel is not protected.
    #[error("TLS is required")]
    TlsRequired,

    /// The current transfer was aborted by the client.
    #[error("transfer aborted")]
    Aborted,

    /// Underlying I/O failure on the control or data channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FtpError {
    /// Wraps a driver-side error with operation/path context.
    pub fn driver<E>(kind: DriverErrorKind, operation: &'static str, path: PathBuf, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver {
            kind,
            operation,
            path,
            source: Box::new(source),
        }
    }

    /// The driver-error kind, if this is a [`FtpError::Driver`].
    #[must_use]
    pub const fn driver_kind(&self) -> Option<DriverErrorKind> {
        match self {
            Self::Driver { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The wire-safe message for this error, never leaking driver internals
    /// beyond the classified kind and the operation/path context.
    #[must_use]
    pub fn wire_message(&self) -> String {
        match self {
            Self::Driver {
                operation, path, ..
            } => format!("{operation} failed for {}", path.display()),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::QuotaExceeded => "quota exceeded",
            Self::FilenameNotAllowed => "filename not allowed",
            Self::PermissionDenied => "permission denied",
            Self::NotFound => "not found",
            Self::LocalError => "local error",
            Self::PageTypeUnknown => "page type unknown",
        };
        f.write_str(s)
    }
}
