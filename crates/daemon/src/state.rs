//! Shared transfer bookkeeping reachable from both the command reader and a
//! concurrently running transfer task.

use transport::TransferHandler;

/// The piece of connection state a spawned transfer task and the command
/// reader both touch: which handler (if any) is installed, and whether a
/// transfer is currently open or has been aborted.
///
/// Guarded by a single `tokio::sync::Mutex` (the "transfer mutex"); every
/// lock is held only long enough to read or flip these fields, never across
/// an `.await` on the data connection itself.
#[derive(Default)]
pub struct TransferState {
    /// The handler installed by the most recent `PASV`/`EPSV`/`PORT`/`EPRT`,
    /// taken by the next transfer-related command that runs.
    pub handler: Option<Box<dyn TransferHandler>>,
    /// Whether a transfer is between its `150` and its closing reply.
    pub is_open: bool,
    /// Whether `ABOR` has fired for the current (or next) transfer.
    pub is_aborted: bool,
}

impl TransferState {
    /// Installs a freshly composed handler, replacing and dropping any
    /// previous one (a new `PASV`/`PORT` always supersedes an unused prior
    /// handler).
    pub fn install(&mut self, handler: Box<dyn TransferHandler>) {
        self.handler = Some(handler);
        self.is_aborted = false;
    }
}
