//! `HASH` and the legacy `XCRC`/`MD5`/`XMD5`/`XSHA1`/`XSHA256`/`XSHA512`
//! single-command digest family.
//!
//! `OPTS HASH <algo>` (which selects the algorithm `HASH` replies use) is
//! handled by [`crate::handlers::misc::opts`], since it shares the
//! `OPTS`-dispatch surface with every other `OPTS` subcommand; this module
//! only owns the algorithms list and the digest computation both it and
//! `opts` need.

use checksums::strong::{Crc32, Md5, Sha1, Sha256, Sha512, StrongDigest};
use core::driver::TransferHandle;
use core::error::FtpError;
use core::status;
use tokio::io::AsyncReadExt;

use crate::connection::Connection;
use crate::handlers::reply_driver_error;

/// Algorithm names accepted by `OPTS HASH` and reported in `FEAT`, in the
/// order a client's first-preference scan should try them.
pub const SUPPORTED_ALGORITHMS: &[&str] = &["SHA-256", "SHA-512", "SHA-1", "MD5", "CRC32"];

/// Matches `name` against [`SUPPORTED_ALGORITHMS`] ignoring case and hyphens,
/// so both the IANA form (`OPTS HASH SHA-256`) and the legacy command form
/// (`XSHA256`) resolve to the same canonical name.
pub(crate) fn normalize(name: &str) -> Option<&'static str> {
    let collapsed: String = name.chars().filter(|c| *c != '-').collect();
    SUPPORTED_ALGORITHMS.iter().copied().find(|candidate| {
        let candidate_collapsed: String = candidate.chars().filter(|c| *c != '-').collect();
        candidate_collapsed.eq_ignore_ascii_case(&collapsed)
    })
}

const CHUNK: usize = 64 * 1024;

async fn digest_hex(handle: &mut dyn TransferHandle, algorithm: &str, byte_count: Option<u64>) -> std::io::Result<String> {
    match algorithm {
        "SHA-256" => stream_digest::<Sha256>(handle, byte_count).await,
        "SHA-512" => stream_digest::<Sha512>(handle, byte_count).await,
        "SHA-1" => stream_digest::<Sha1>(handle, byte_count).await,
        "MD5" => stream_digest::<Md5>(handle, byte_count).await,
        "CRC32" => stream_digest::<Crc32>(handle, byte_count).await,
        other => unreachable!("normalize() only returns names from SUPPORTED_ALGORITHMS, got {other}"),
    }
}

async fn stream_digest<D: StrongDigest>(handle: &mut dyn TransferHandle, byte_count: Option<u64>) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut remaining = byte_count;
    let mut buf = vec![0u8; CHUNK];
    loop {
        let want = remaining.map_or(buf.len(), |r| buf.len().min(r as usize));
        if want == 0 {
            break;
        }
        let n = handle.read(&mut buf[..want]).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        if let Some(r) = &mut remaining {
            *r -= n as u64;
        }
    }
    let digest = hasher.finalize();
    Ok(hex(digest.as_ref()))
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// `HASH [path]`: hashes the whole file using the session's selected
/// algorithm (`OPTS HASH`, default SHA-256).
pub async fn hash(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if !conn.settings().enable_hash {
        conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "HASH is disabled").await;
        return Ok(());
    }
    let Some(fs) = conn.filesystem.clone() else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);
    let algorithm = conn.hash_algorithm.clone();

    if let Some(extension) = fs.as_hasher() {
        let size = match fs.stat(&target).await {
            Ok(meta) => meta.len(),
            Err(err) => {
                reply_driver_error(&conn.writer, &err).await;
                return Ok(());
            }
        };
        match extension.hash(&target, &algorithm.to_ascii_lowercase(), 0, size).await {
            Ok(digest) => {
                conn.writer
                    .reply(
                        status::FILE_STATUS,
                        format!("{algorithm} 0-{size} {digest} {}", target.display()),
                    )
                    .await;
            }
            Err(err) => reply_driver_error(&conn.writer, &err).await,
        }
        return Ok(());
    }

    let mut handle = match fs.open_read(&target).await {
        Ok(handle) => handle,
        Err(err) => {
            reply_driver_error(&conn.writer, &err).await;
            return Ok(());
        }
    };
    match digest_hex(handle.as_mut(), &algorithm, None).await {
        Ok(digest) => {
            conn.writer
                .reply(status::FILE_STATUS, format!("{algorithm} {digest} {}", target.display()))
                .await;
        }
        Err(err) => conn.writer.reply(status::FILE_UNAVAILABLE, err.to_string()).await,
    }
    Ok(())
}

/// The legacy single-algorithm commands (`XCRC`, `MD5`/`XMD5`, `XSHA1`,
/// `XSHA256`, `XSHA512`), each fixed to one algorithm regardless of `OPTS
/// HASH`.
pub async fn legacy(conn: &mut Connection, param: &str, algorithm: &str) -> Result<(), FtpError> {
    if !conn.settings().enable_hash {
        conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "hash commands are disabled").await;
        return Ok(());
    }
    let Some(normalized) = normalize(algorithm) else {
        unreachable!("legacy() is only called with names in SUPPORTED_ALGORITHMS");
    };
    let Some(fs) = conn.filesystem.clone() else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);

    if let Some(extension) = fs.as_hasher() {
        let size = match fs.stat(&target).await {
            Ok(meta) => meta.len(),
            Err(err) => {
                reply_driver_error(&conn.writer, &err).await;
                return Ok(());
            }
        };
        match extension.hash(&target, &normalized.to_ascii_lowercase(), 0, size).await {
            Ok(digest) => conn.writer.reply(status::FILE_ACTION_OK, digest).await,
            Err(err) => reply_driver_error(&conn.writer, &err).await,
        }
        return Ok(());
    }

    let mut handle = match fs.open_read(&target).await {
        Ok(handle) => handle,
        Err(err) => {
            reply_driver_error(&conn.writer, &err).await;
            return Ok(());
        }
    };
    match digest_hex(handle.as_mut(), normalized, None).await {
        Ok(digest) => conn.writer.reply(status::FILE_ACTION_OK, digest).await,
        Err(err) => conn.writer.reply(status::FILE_UNAVAILABLE, err.to_string()).await,
    }
    Ok(())
}
