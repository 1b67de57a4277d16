//! `RETR`/`STOR`/`APPE`/`STOU`/`LIST`/`NLST`/`MLSD`: the copy loop that runs
//! on its own spawned task, once the command reader has handed off the
//! installed data-connection handler.
//!
//! Everything here runs off the control channel's read path; replies are
//! sent through a cloned [`ControlWriter`] so they interleave correctly
//! with whatever the reader sends for commands that race ahead (`ABOR`,
//! bare `STAT`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use core::driver::FileSystem;
use core::error::FtpError;
use core::metadata::{Fileinfo, Metadata};
use core::settings::TransferType;
use core::status;
use protocol::ascii::{AsciiConverter, AsciiMode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{Mutex, Notify};
use transport::{DataStream, TransferHandler};

use crate::handlers::reply_driver_error;
use crate::path::abs_path;
use crate::state::TransferState;
use crate::timefmt;
use crate::writer::ControlWriter;

const COPY_CHUNK: usize = 64 * 1024;

/// Everything a spawned transfer task needs, handed off by the command
/// reader once it has taken the installed data-connection handler.
pub struct TransferJob {
    /// The transfer-related command verb (`RETR`, `STOR`, …).
    pub command: &'static str,
    /// The command's raw parameter, unresolved.
    pub param: String,
    /// `param` resolved against the working directory at dispatch time.
    /// Used as-is by file transfers; listing commands re-resolve from
    /// [`Self::current_path`] since a `LIST`/`NLST` parameter may carry
    /// `-l`/`-a` style flags ahead of the path.
    pub path: PathBuf,
    /// The working directory at dispatch time.
    pub current_path: String,
    /// Whether `-`-prefixed listing flags are rejected outright.
    pub disable_list_args: bool,
    /// Byte offset from a pending `REST`, consumed by this transfer only.
    pub rest_offset: u64,
    /// `TYPE A`/`TYPE I` in effect for this transfer.
    pub transfer_type: TransferType,
    /// The data-connection handler installed by the preceding `PASV`/`PORT`.
    pub handler: Box<dyn TransferHandler>,
    /// The authenticated session's filesystem.
    pub filesystem: Arc<dyn FileSystem>,
    /// Handle to queue control-channel replies.
    pub writer: ControlWriter,
    /// Shared open/aborted bookkeeping, also touched by `ABOR`.
    pub transfer_state: Arc<Mutex<TransferState>>,
    /// Signaled by `ABOR` to interrupt an in-flight copy.
    pub abort_notify: Arc<Notify>,
    /// Whether the server's TLS policy requires this data connection to be
    /// protected.
    pub tls_mandatory: bool,
    /// Whether `PROT P` is in effect for this transfer.
    pub transfer_tls: bool,
}

enum Outcome {
    Done(String),
    Aborted,
    Failed(FtpError),
    Io(std::io::Error),
    BadRequest(String),
}

/// Runs one transfer to completion, sending its own `150` and final reply.
pub async fn run(mut job: TransferJob) {
    if job.tls_mandatory && !job.transfer_tls && !job.handler.is_tls() {
        job.writer
            .reply(status::TLS_REQUIRED, "TLS is required for data transfers")
            .await;
        return;
    }

    {
        let mut state = job.transfer_state.lock().await;
        state.is_open = true;
        state.is_aborted = false;
    }

    job.writer
        .reply(status::FILE_STATUS_OK, opening_message(&job))
        .await;

    let stream = match job.handler.open().await {
        Ok(stream) => stream,
        Err(err) => {
            let mut state = job.transfer_state.lock().await;
            state.is_open = false;
            drop(state);
            job.writer
                .reply(status::CANT_OPEN_DATA_CONNECTION, err.wire_message())
                .await;
            return;
        }
    };

    let outcome = run_transfer(&job, stream).await;

    {
        let mut state = job.transfer_state.lock().await;
        state.is_open = false;
    }
    let _ = job.handler.close().await;

    match outcome {
        Outcome::Done(summary) => job.writer.reply(status::CLOSING_DATA_CONNECTION, summary).await,
        Outcome::Aborted => {
            // `abor()` owns the 426/226 sequence for an aborted transfer; it
            // already replied by the time this task observes the abort, so
            // sending anything here would duplicate its reply.
        }
        Outcome::Failed(err) => reply_driver_error(&job.writer, &err).await,
        Outcome::Io(err) => {
            job.writer
                .reply(status::CONNECTION_CLOSED_TRANSFER_ABORTED, err.to_string())
                .await;
        }
        Outcome::BadRequest(message) => {
            job.writer.reply(status::SYNTAX_ERROR_PARAMETERS, message).await;
        }
    }
}

fn opening_message(job: &TransferJob) -> String {
    match job.transfer_type {
        TransferType::Ascii => format!("Opening ASCII mode data connection for {}", job.param),
        TransferType::Binary => format!("Opening BINARY mode data connection for {}", job.param),
    }
}

async fn run_transfer(job: &TransferJob, stream: Box<dyn DataStream>) -> Outcome {
    match job.command {
        "RETR" => retrieve(job, stream).await,
        "STOR" => store(job, stream, false).await,
        "APPE" => store(job, stream, true).await,
        "STOU" => store_unique(job, stream).await,
        "LIST" => list(job, stream, ListFormat::Long).await,
        "NLST" => list(job, stream, ListFormat::NamesOnly).await,
        "MLSD" => list(job, stream, ListFormat::Machine).await,
        other => unreachable!("spawn_transfer only spawns transfer-related commands, got {other}"),
    }
}

async fn retrieve(job: &TransferJob, mut data: Box<dyn DataStream>) -> Outcome {
    let mut handle = match job.filesystem.open_read(&job.path).await {
        Ok(handle) => handle,
        Err(err) => return Outcome::Failed(err),
    };
    if job.rest_offset > 0 {
        if let Err(err) = handle.seek_from_start(job.rest_offset).await {
            return Outcome::Io(err);
        }
    }

    let mut buf = vec![0u8; COPY_CHUNK];
    let mut converter = matches!(job.transfer_type, TransferType::Ascii).then(|| AsciiConverter::new(AsciiMode::ToLf));
    let mut converted = Vec::new();
    let mut bytes_sent = 0u64;

    loop {
        tokio::select! {
            biased;
            () = job.abort_notify.notified() => {
                handle.notify_transfer_error(&FtpError::Aborted);
                return Outcome::Aborted;
            }
            read = handle.read(&mut buf) => {
                let n = match read {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(err) => {
                        handle.notify_transfer_error(&FtpError::Io(io_err_clone(&err)));
                        return Outcome::Io(err);
                    }
                };
                let chunk: &[u8] = match &mut converter {
                    Some(conv) => {
                        converted.clear();
                        conv.convert(&buf[..n], &mut converted);
                        &converted
                    }
                    None => &buf[..n],
                };
                if let Err(err) = data.write_all(chunk).await {
                    handle.notify_transfer_error(&FtpError::Io(io_err_clone(&err)));
                    return Outcome::Io(err);
                }
                bytes_sent += chunk.len() as u64;
            }
        }
    }

    if let Some(conv) = converter.take() {
        converted.clear();
        conv.finish(&mut converted);
        if !converted.is_empty() {
            if let Err(err) = data.write_all(&converted).await {
                return Outcome::Io(err);
            }
        }
    }

    Outcome::Done(format!("Transfer complete ({bytes_sent} bytes)"))
}

async fn store(job: &TransferJob, mut data: Box<dyn DataStream>, append: bool) -> Outcome {
    let mut handle = match job.filesystem.open_write(&job.path, append).await {
        Ok(handle) => handle,
        Err(err) => return Outcome::Failed(err),
    };
    if !append && job.rest_offset > 0 {
        if let Err(err) = handle.seek_from_start(job.rest_offset).await {
            return Outcome::Io(err);
        }
    }
    copy_into(job, data.as_mut(), handle.as_mut()).await
}

async fn store_unique(job: &TransferJob, mut data: Box<dyn DataStream>) -> Outcome {
    let base = if job.param.trim().is_empty() {
        abs_path(&job.current_path, "ftp.dat")
    } else {
        job.path.clone()
    };
    let unique = match unique_path(&job.filesystem, &base).await {
        Ok(path) => path,
        Err(err) => return Outcome::Failed(err),
    };
    let mut handle = match job.filesystem.open_write(&unique, false).await {
        Ok(handle) => handle,
        Err(err) => return Outcome::Failed(err),
    };
    match copy_into(job, data.as_mut(), handle.as_mut()).await {
        Outcome::Done(summary) => Outcome::Done(format!("{summary}; {}", unique.display())),
        other => other,
    }
}

async fn unique_path(fs: &Arc<dyn FileSystem>, base: &Path) -> Result<PathBuf, FtpError> {
    if fs.stat(base).await.is_err() {
        return Ok(base.to_path_buf());
    }
    for suffix in 1..=9999u32 {
        let candidate = suffixed(base, suffix);
        if fs.stat(&candidate).await.is_err() {
            return Ok(candidate);
        }
    }
    Err(FtpError::driver(
        core::error::DriverErrorKind::LocalError,
        "STOU",
        base.to_path_buf(),
        std::io::Error::new(std::io::ErrorKind::AlreadyExists, "could not find a free name"),
    ))
}

fn suffixed(base: &Path, suffix: u32) -> PathBuf {
    let name = base.file_name().and_then(|n| n.to_str()).unwrap_or("ftp.dat");
    base.with_file_name(format!("{name}.{suffix}"))
}

async fn copy_into(job: &TransferJob, data: &mut (dyn DataStream), handle: &mut (dyn core::driver::TransferHandle)) -> Outcome {
    let mut buf = vec![0u8; COPY_CHUNK];
    let mut converter = matches!(job.transfer_type, TransferType::Ascii).then(|| AsciiConverter::new(AsciiMode::ToCrlf));
    let mut converted = Vec::new();
    let mut bytes_received = 0u64;

    loop {
        tokio::select! {
            biased;
            () = job.abort_notify.notified() => {
                handle.notify_transfer_error(&FtpError::Aborted);
                return Outcome::Aborted;
            }
            read = data.read(&mut buf) => {
                let n = match read {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(err) => {
                        handle.notify_transfer_error(&FtpError::Io(io_err_clone(&err)));
                        return Outcome::Io(err);
                    }
                };
                let chunk: &[u8] = match &mut converter {
                    Some(conv) => {
                        converted.clear();
                        conv.convert(&buf[..n], &mut converted);
                        &converted
                    }
                    None => &buf[..n],
                };
                if let Err(err) = handle.write_all(chunk).await {
                    handle.notify_transfer_error(&FtpError::Io(io_err_clone(&err)));
                    return Outcome::Io(err);
                }
                bytes_received += chunk.len() as u64;
            }
        }
    }

    if let Some(conv) = converter.take() {
        converted.clear();
        conv.finish(&mut converted);
        if !converted.is_empty() {
            if let Err(err) = handle.write_all(&converted).await {
                return Outcome::Io(err);
            }
        }
    }

    Outcome::Done(format!("Transfer complete ({bytes_received} bytes)"))
}

fn io_err_clone(err: &std::io::Error) -> std::io::Error {
    std::io::Error::new(err.kind(), err.to_string())
}

#[derive(Clone, Copy)]
enum ListFormat {
    Long,
    NamesOnly,
    Machine,
}

async fn list(job: &TransferJob, mut data: Box<dyn DataStream>, format: ListFormat) -> Outcome {
    let target = match listing_target(&job.param, job.disable_list_args) {
        Ok(target) => target,
        Err(message) => return Outcome::BadRequest(message),
    };
    let dir = abs_path(&job.current_path, target.as_deref().unwrap_or(""));

    let entries = match job.filesystem.list(&dir).await {
        Ok(entries) => entries,
        Err(err) => return Outcome::Failed(err),
    };

    let mut body = String::new();
    for entry in &entries {
        let line = match format {
            ListFormat::Long => format_list_entry(entry),
            ListFormat::NamesOnly => entry.name().to_string(),
            ListFormat::Machine => format_mlsd_entry(entry.metadata.as_ref(), entry.name()),
        };
        body.push_str(&line);
        body.push_str("\r\n");
    }

    tokio::select! {
        biased;
        () = job.abort_notify.notified() => Outcome::Aborted,
        result = data.write_all(body.as_bytes()) => match result {
            Ok(()) => Outcome::Done(format!("Directory send OK ({} entries)", entries.len())),
            Err(err) => Outcome::Io(err),
        },
    }
}

/// Strips `-`-prefixed flag tokens from a `LIST`/`NLST` parameter, returning
/// the remaining path argument, if any.
fn listing_target(param: &str, disable_list_args: bool) -> Result<Option<String>, String> {
    let mut target = None;
    for token in param.split_whitespace() {
        if let Some(stripped) = token.strip_prefix('-') {
            if disable_list_args {
                return Err("listing flags are disabled".to_string());
            }
            if stripped.is_empty() {
                return Err("malformed listing flag".to_string());
            }
            continue;
        }
        target = Some(token.to_string());
    }
    Ok(target)
}

/// `ls -l`-style rendering: permissions, a fixed link count, owner/group IDs,
/// size, modification time, and name.
pub(crate) fn format_list_entry(entry: &Fileinfo<PathBuf, Box<dyn Metadata + Send>>) -> String {
    let meta = &entry.metadata;
    let modified = meta
        .modified()
        .map(timefmt::format_list_date)
        .unwrap_or_else(|_| "Jan  1  1970".to_string());
    format!(
        "{} 1 {} {} {:>13} {} {}",
        meta.permissions().to_rwx_string(meta.is_dir()),
        meta.uid(),
        meta.gid(),
        meta.len(),
        modified,
        entry.name()
    )
}

/// `MLSD`/`MLST` entry: RFC 3659 facts followed by a space and the name.
#[must_use]
pub fn format_mlsd_entry(meta: &dyn Metadata, name: &str) -> String {
    let kind = if meta.is_dir() { "dir" } else { "file" };
    let modify = meta.modified().map(timefmt::format_utc).unwrap_or_default();
    format!("Type={kind};Size={};Modify={modify}; {name}", meta.len())
}
