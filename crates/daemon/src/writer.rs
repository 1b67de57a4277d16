//! The control channel's single writer task.
//!
//! Every reply — whether produced inline by the command reader or by a
//! concurrently running transfer task — is serialized through one owner of
//! the write half, so responses never interleave mid-line on the wire. This
//! is also the seam `AUTH TLS` upgrades through: the reader requests the
//! write half back, rejoins it with its own read half, performs the TLS
//! handshake, and starts a fresh writer task over the upgraded stream.

use tokio::io::WriteHalf;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;
use transport::DataStream;

use protocol::write_multiline_reply;

/// A request sent to the writer task.
pub enum WriterCommand {
    /// Write a reply; a single-element `lines` is the single-line form.
    Reply(u16, Vec<String>),
    /// Hand the write half back to the caller (for a TLS upgrade) and exit.
    TakeHalf(oneshot::Sender<WriteHalf<Box<dyn DataStream>>>),
}

/// A cheaply cloneable handle used to queue writes from any task on this
/// connection.
#[derive(Clone)]
pub struct ControlWriter {
    tx: mpsc::Sender<WriterCommand>,
}

impl ControlWriter {
    /// Queues a single-line reply.
    pub async fn reply(&self, code: u16, text: impl Into<String>) {
        self.reply_lines(code, vec![text.into()]).await;
    }

    /// Queues a reply whose final line closes a multi-line body.
    pub async fn reply_lines(&self, code: u16, lines: Vec<String>) {
        if self.tx.send(WriterCommand::Reply(code, lines)).await.is_err() {
            warn!(code, "dropped reply: writer task is gone");
        }
    }

    /// Requests the write half back, for a TLS upgrade. Ends the writer
    /// task that currently owns it.
    pub async fn take_half(&self) -> Option<WriteHalf<Box<dyn DataStream>>> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(WriterCommand::TakeHalf(tx)).await.is_err() {
            return None;
        }
        rx.await.ok()
    }
}

/// Spawns the writer task over `write_half`, returning a handle to queue
/// writes on it.
pub fn spawn_writer(write_half: WriteHalf<Box<dyn DataStream>>) -> ControlWriter {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(writer_loop(write_half, rx));
    ControlWriter { tx }
}

async fn writer_loop(
    mut write_half: WriteHalf<Box<dyn DataStream>>,
    mut rx: mpsc::Receiver<WriterCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            WriterCommand::Reply(code, lines) => {
                if let Err(err) = write_multiline_reply(&mut write_half, code, lines).await {
                    warn!(%err, "control channel write failed");
                    return;
                }
            }
            WriterCommand::TakeHalf(respond_to) => {
                let _ = respond_to.send(write_half);
                return;
            }
        }
    }
}
