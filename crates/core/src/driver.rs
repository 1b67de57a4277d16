//! The driver boundary: everything the core calls outward.
//!
//! A host application implements [`Driver`] to supply settings, a TLS
//! configuration, connection lifecycle hooks, and authentication; a
//! successful [`Driver::authenticate`] call returns a [`FileSystem`] that
//! answers every path-facing command for the rest of that session. Optional
//! capability extensions (allocate, symlink, hasher, available-space, SITE
//! subcommands, …) are modeled as their own small traits a [`FileSystem`]
//! may additionally implement; a driver that supports one overrides the
//! matching `as_*` accessor below to return `Some(self)`, and the daemon
//! probes for it once per relevant command.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::context::ClientContext;
use crate::error::FtpError;
use crate::metadata::{Fileinfo, Metadata};
use crate::settings::Settings;

/// A driver-provided, seekable, async byte handle for one open file.
pub trait TransferHandle: AsyncRead + AsyncWrite + Send + Unpin {
    /// Seeks to `offset` bytes from the start of the file, as required to
    /// honor a pending `REST` before a transfer begins.
    fn seek_from_start<'a>(
        &'a mut self,
        offset: u64,
    ) -> Pin<Box<dyn std::future::Future<Output = io::Result<()>> + Send + 'a>>;

    /// Called when a transfer is abandoned mid-copy (error or `ABOR`) so the
    /// driver can discard a partial write rather than leaving a truncated
    /// file in place. The default implementation does nothing.
    fn notify_transfer_error(&mut self, _error: &FtpError) {}
}

/// Per-session filesystem contract. Returned by [`Driver::authenticate`] on
/// success; every subsequent path-facing command in this session goes
/// through this object.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Stats the entry at `path`, returning driver-defined metadata.
    async fn stat(&self, path: &Path) -> Result<Box<dyn Metadata + Send>, FtpError>;

    /// Lists the entries directly under `path`.
    async fn list(
        &self,
        path: &Path,
    ) -> Result<Vec<Fileinfo<PathBuf, Box<dyn Metadata + Send>>>, FtpError>;

    /// Opens `path` for reading, honoring an eventual `REST` seek.
    async fn open_read(&self, path: &Path) -> Result<Box<dyn TransferHandle>, FtpError>;

    /// Opens `path` for writing, truncating if it exists and `append` is
    /// `false`, creating it if it doesn't.
    async fn open_write(
        &self,
        path: &Path,
        append: bool,
    ) -> Result<Box<dyn TransferHandle>, FtpError>;

    /// Creates a directory at `path`.
    async fn mkdir(&self, path: &Path) -> Result<(), FtpError>;

    /// Removes the file at `path`.
    async fn remove_file(&self, path: &Path) -> Result<(), FtpError>;

    /// Removes the empty directory at `path`.
    async fn remove_dir(&self, path: &Path) -> Result<(), FtpError>;

    /// Renames `from` to `to`.
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), FtpError>;

    /// Sets the modification time on `path`, for `MFMT`.
    async fn set_modified(&self, path: &Path, time: std::time::SystemTime) -> Result<(), FtpError>;

    /// Exposes [`AllocateExtension`], if this filesystem supports `SITE`
    /// space reservation. Defaults to unsupported.
    fn as_allocate(&self) -> Option<&dyn AllocateExtension> {
        None
    }

    /// Exposes [`SymlinkExtension`], if this filesystem supports `SITE
    /// SYMLINK`. Defaults to unsupported.
    fn as_symlink(&self) -> Option<&dyn SymlinkExtension> {
        None
    }

    /// Exposes [`ChmodExtension`], if this filesystem supports `SITE
    /// CHMOD`. Defaults to unsupported.
    fn as_chmod(&self) -> Option<&dyn ChmodExtension> {
        None
    }

    /// Exposes [`ChownExtension`], if this filesystem supports `SITE
    /// CHOWN`. Defaults to unsupported.
    fn as_chown(&self) -> Option<&dyn ChownExtension> {
        None
    }

    /// Exposes [`AvailableSpaceExtension`], if this filesystem can report
    /// free space for `AVBL`. Defaults to unsupported.
    fn as_available_space(&self) -> Option<&dyn AvailableSpaceExtension> {
        None
    }

    /// Exposes [`HasherExtension`], if this filesystem can compute digests
    /// itself for `HASH`/`XCRC`/`XMD5`/`XSHA*`. Defaults to unsupported,
    /// which falls back to the daemon streaming the file through its own
    /// hasher.
    fn as_hasher(&self) -> Option<&dyn HasherExtension> {
        None
    }
}

/// Optional capability: allocate space ahead of a write (`SITE` advance
/// hints / quota pre-checks some drivers want to perform eagerly).
#[async_trait]
pub trait AllocateExtension: Send + Sync {
    /// Reserves `bytes` of space for an upcoming write to `path`.
    async fn allocate(&self, path: &Path, bytes: u64) -> Result<(), FtpError>;
}

/// Optional capability: create a symbolic link (`SITE SYMLINK`).
#[async_trait]
pub trait SymlinkExtension: Send + Sync {
    /// Creates a symlink at `link` pointing to `target`.
    async fn symlink(&self, link: &Path, target: &Path) -> Result<(), FtpError>;
}

/// Optional capability: change Unix-style permission bits (`SITE CHMOD`).
#[async_trait]
pub trait ChmodExtension: Send + Sync {
    /// Sets the mode bits on `path`.
    async fn chmod(&self, path: &Path, mode: u32) -> Result<(), FtpError>;
}

/// Optional capability: change file ownership (`SITE CHOWN`).
#[async_trait]
pub trait ChownExtension: Send + Sync {
    /// Sets the owning user (and, if given, group) on `path`.
    async fn chown(&self, path: &Path, uid: u32, gid: Option<u32>) -> Result<(), FtpError>;
}

/// Optional capability: report free space for `AVBL`.
#[async_trait]
pub trait AvailableSpaceExtension: Send + Sync {
    /// Bytes of storage available for writes under `path`.
    async fn available_space(&self, path: &Path) -> Result<u64, FtpError>;
}

/// Optional capability: compute a digest without the daemon having to
/// stream the file itself, for `HASH`/`XCRC`/`XMD5`/`XSHA*`.
#[async_trait]
pub trait HasherExtension: Send + Sync {
    /// Computes a hex-encoded digest of `path[start..end)` using the named
    /// algorithm (one of `"crc32"`, `"md5"`, `"sha1"`, `"sha256"`,
    /// `"sha512"`).
    async fn hash(
        &self,
        path: &Path,
        algorithm: &str,
        start: u64,
        end: u64,
    ) -> Result<String, FtpError>;
}

/// Server-wide callbacks a host implements once per server instance.
///
/// `authenticate` is the only call that returns session state (a
/// [`FileSystem`]); everything else configures or observes the server as a
/// whole.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Returns the settings this server instance should run with.
    fn settings(&self) -> &Settings;

    /// Called once per accepted connection, before the greeting is sent.
    /// Returning an error rejects the connection with `421 <message>`.
    async fn client_connected(&self, ctx: &ClientContext) -> Result<String, FtpError>;

    /// Called once per connection as it is torn down, for cleanup/metrics.
    async fn client_disconnected(&self, ctx: &ClientContext);

    /// Verifies `user`/`pass` and, on success, returns the filesystem this
    /// session should use for every subsequent path-facing command.
    async fn authenticate(
        &self,
        ctx: &ClientContext,
        user: &str,
        pass: &str,
    ) -> Result<Box<dyn FileSystem>, FtpError>;
}
