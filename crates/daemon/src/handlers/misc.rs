//! The remaining RFC 959 housekeeping commands, plus the `FEAT`/`OPTS`
//! negotiation surface and the two special-action handlers the dispatch
//! loop calls directly (`ABOR`, bare `STAT`).

use core::error::FtpError;
use core::metadata::Fileinfo;
use core::settings::TransferType;
use core::status;

use crate::connection::Connection;
use crate::handlers::hash;
use crate::handlers::reply_driver_error;
use crate::handlers::transfer::format_list_entry;

/// `REST <offset>`: records the byte offset the next transfer should seek
/// to, consumed (and reset) by that transfer.
pub async fn rest(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    match param.trim().parse::<u64>() {
        Ok(offset) => {
            conn.rest_offset = offset;
            conn.writer
                .reply(status::FILE_ACTION_PENDING, format!("Restarting at {offset}. Send STOR or RETR"))
                .await;
        }
        Err(_) => {
            conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "REST requires a numeric offset").await;
        }
    }
    Ok(())
}

/// `TYPE A`/`TYPE I` (and the obsolete `TYPE A N`/`TYPE L 8` forms, accepted
/// and normalized to their base type).
pub async fn type_cmd(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let mut tokens = param.split_whitespace();
    match tokens.next().map(str::to_ascii_uppercase).as_deref() {
        Some("A") => {
            conn.transfer_type = TransferType::Ascii;
            conn.writer.reply(status::COMMAND_OK, "Type set to A").await;
        }
        Some("I") | Some("L") => {
            conn.transfer_type = TransferType::Binary;
            conn.writer.reply(status::COMMAND_OK, "Type set to I").await;
        }
        _ => {
            conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED_FOR_PARAMETER, "Unsupported TYPE").await;
        }
    }
    Ok(())
}

/// `MODE S`: stream mode is the only one this server implements.
pub async fn mode(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if param.trim().eq_ignore_ascii_case("S") {
        conn.writer.reply(status::COMMAND_OK, "Mode set to S").await;
    } else {
        conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED_FOR_PARAMETER, "Only stream mode is supported").await;
    }
    Ok(())
}

/// `STRU F`: file structure is the only one this server implements.
pub async fn stru(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if param.trim().eq_ignore_ascii_case("F") {
        conn.writer.reply(status::COMMAND_OK, "Structure set to F").await;
    } else {
        conn.writer
            .reply(status::PAGE_TYPE_UNKNOWN, "Only file structure is supported")
            .await;
    }
    Ok(())
}

/// `NOOP`.
pub async fn noop(conn: &mut Connection) -> Result<(), FtpError> {
    conn.writer.reply(status::COMMAND_OK, "NOOP command successful").await;
    Ok(())
}

/// `CLNT <name>`: records the client's self-reported identity for logging.
pub async fn clnt(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    conn.client_version = Some(param.to_string());
    conn.writer.reply(status::COMMAND_OK, "CLNT command successful").await;
    Ok(())
}

/// `SYST`.
pub async fn syst(conn: &mut Connection) -> Result<(), FtpError> {
    if conn.settings().disable_syst {
        conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "SYST is disabled").await;
        return Ok(());
    }
    conn.writer.reply(status::NAME_SYSTEM_TYPE, "UNIX Type: L8").await;
    Ok(())
}

/// `STAT <path>`: a file-inquiry variant of `LIST`, sent over the control
/// channel rather than a data connection.
pub async fn stat_path(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if conn.settings().disable_stat {
        conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "STAT is disabled").await;
        return Ok(());
    }
    let Some(fs) = conn.filesystem.clone() else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);

    let entries = if param.trim().is_empty() {
        fs.list(&target).await
    } else {
        match fs.stat(&target).await {
            Ok(meta) if meta.is_dir() => fs.list(&target).await,
            Ok(meta) => Ok(vec![Fileinfo {
                path: target.clone(),
                metadata: meta,
            }]),
            Err(err) => Err(err),
        }
    };

    match entries {
        Ok(entries) => {
            let mut lines = vec![format!("Status of {}:", target.display())];
            lines.extend(entries.iter().map(format_list_entry));
            lines.push("End of status".to_string());
            conn.writer.reply_lines(status::DIRECTORY_STATUS, lines).await;
        }
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `FEAT`: advertises every optional extension this server can speak.
pub async fn feat(conn: &mut Connection) -> Result<(), FtpError> {
    let settings = conn.settings();
    let mut lines = vec!["Extensions supported:".to_string()];
    lines.push(" UTF8".to_string());
    lines.push(" REST STREAM".to_string());
    lines.push(" SIZE".to_string());
    lines.push(" MDTM".to_string());
    if !settings.disable_mfmt {
        lines.push(" MFMT".to_string());
    }
    if !settings.disable_mlst {
        lines.push(" MLST Type*;Size*;Modify*;Perm*;".to_string());
    }
    if !settings.disable_mlsd {
        lines.push(" MLSD".to_string());
    }
    lines.push(" PBSZ".to_string());
    lines.push(" PROT".to_string());
    lines.push(" AUTH TLS".to_string());
    if settings.enable_hash {
        lines.push(format!(" HASH {}", hash::SUPPORTED_ALGORITHMS.join(";")));
    }
    if settings.enable_comb {
        lines.push(" COMB".to_string());
    }
    lines.push("End".to_string());
    conn.writer.reply_lines(status::SYSTEM_STATUS, lines).await;
    Ok(())
}

/// `OPTS <command> <value>`: parameter negotiation for the commands that
/// support it (`UTF8`, `MLST`, `HASH`).
pub async fn opts(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let mut parts = param.splitn(2, char::is_whitespace);
    let subcommand = parts.next().unwrap_or("").to_ascii_uppercase();
    let value = parts.next().unwrap_or("").trim();

    match subcommand.as_str() {
        "UTF8" => {
            conn.writer.reply(status::COMMAND_OK, "UTF8 set to on").await;
        }
        "MLST" => {
            conn.writer.reply(status::COMMAND_OK, format!("MLST OPTS {value}")).await;
        }
        "HASH" => {
            if !conn.settings().enable_hash {
                conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "HASH is disabled").await;
                return Ok(());
            }
            if value.is_empty() {
                conn.writer.reply(status::FILE_STATUS, conn.hash_algorithm.clone()).await;
                return Ok(());
            }
            match hash::normalize(value) {
                Some(algorithm) => {
                    conn.hash_algorithm = algorithm.to_string();
                    conn.writer.reply(status::FILE_STATUS, format!("HASH set to {algorithm}")).await;
                }
                None => {
                    conn.writer
                        .reply(status::COMMAND_NOT_IMPLEMENTED_FOR_PARAMETER, "Unsupported hash algorithm")
                        .await;
                }
            }
        }
        _ => {
            conn.writer
                .reply(status::COMMAND_NOT_IMPLEMENTED_FOR_PARAMETER, format!("OPTS {subcommand} not supported"))
                .await;
        }
    }
    Ok(())
}

/// `AVBL [path]`: bytes of storage available, if the driver can report it.
pub async fn avbl(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let Some(fs) = conn.filesystem.clone() else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let Some(extension) = fs.as_available_space() else {
        conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "AVBL not supported").await;
        return Ok(());
    };
    let target = conn.abs_path(param);
    match extension.available_space(&target).await {
        Ok(bytes) => conn.writer.reply(status::FILE_STATUS, bytes.to_string()).await,
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `ALLO <bytes> [R <records>]`: a pre-allocation hint. Forwarded to
/// [`core::driver::AllocateExtension`] when the driver implements it,
/// otherwise accepted as superfluous per RFC 959.
pub async fn allo(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let Some(bytes) = param.split_whitespace().next().and_then(|n| n.parse::<u64>().ok()) else {
        conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "ALLO requires a byte count").await;
        return Ok(());
    };
    let Some(fs) = conn.filesystem.clone() else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let Some(extension) = fs.as_allocate() else {
        conn.writer
            .reply(status::COMMAND_NOT_IMPLEMENTED_SUPERFLUOUS, "ALLO command superfluous")
            .await;
        return Ok(());
    };
    let target = conn.abs_path("");
    match extension.allocate(&target, bytes).await {
        Ok(()) => conn.writer.reply(status::COMMAND_OK, "ALLO command successful").await,
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `HELP [command]`.
pub async fn help(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if param.trim().is_empty() {
        conn.writer
            .reply_lines(
                status::HELP_MESSAGE,
                vec![
                    "The following commands are recognized:".to_string(),
                    "USER PASS ACCT CWD CDUP PWD MKD RMD RNFR RNTO DELE SIZE MDTM MFMT".to_string(),
                    "RETR STOR APPE STOU LIST NLST MLSD MLST COMB REST TYPE MODE STRU".to_string(),
                    "PORT EPRT PASV EPSV AUTH PROT PBSZ SITE HASH FEAT OPTS AVBL ALLO".to_string(),
                    "NOOP CLNT SYST STAT QUIT ABOR HELP".to_string(),
                    "End of help".to_string(),
                ],
            )
            .await;
    } else {
        conn.writer
            .reply(status::HELP_MESSAGE, format!("Syntax: {} (see RFC 959)", param.trim().to_ascii_uppercase()))
            .await;
    }
    Ok(())
}

/// The text `QUIT` replies with; a function so the dispatch loop can send
/// it after waiting for an in-flight transfer rather than embedding the
/// string inline.
pub async fn quit_message(conn: &Connection) -> String {
    let _ = conn;
    "Goodbye".to_string()
}

/// `ABOR`: signals any in-flight transfer to stop and owns the whole abort
/// reply sequence (§4.4): `426` first if a transfer was open, then always a
/// closing `226`. The spawned transfer task (if any) suppresses its own
/// terminal reply once it observes the abort, so exactly one `226` reaches
/// the wire.
pub async fn abor(conn: &mut Connection) -> Result<(), FtpError> {
    let (was_open, pending_handler) = {
        let mut state = conn.transfer.lock().await;
        let was_open = state.is_open;
        state.is_aborted = true;
        // A handler not yet taken by a transfer task (PASV/PORT ran but no
        // RETR/STOR/LIST followed) isn't reachable by the abort signal; close
        // it here instead of leaving it installed for the next command.
        let pending_handler = if was_open { None } else { state.handler.take() };
        (was_open, pending_handler)
    };
    conn.abort_notify.notify_waiters();

    if let Some(mut handler) = pending_handler {
        let _ = handler.close().await;
    }

    if was_open {
        conn.writer
            .reply(status::CONNECTION_CLOSED_TRANSFER_ABORTED, "Connection closed; transfer aborted")
            .await;
    }
    conn.writer
        .reply(status::CLOSING_DATA_CONNECTION, "ABOR successful; closing transfer connection")
        .await;
    Ok(())
}

/// Bare `STAT`: a server status overview, usable even while a transfer is
/// running on another task.
pub async fn stat_status(conn: &mut Connection) -> Result<(), FtpError> {
    if conn.settings().disable_stat {
        conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "STAT is disabled").await;
        return Ok(());
    }
    let transfer_busy = conn.transfer.lock().await.is_open;
    let lines = vec![
        format!("Connected to {}", conn.remote_addr()),
        format!(
            "Logged in as {}",
            conn.pending_user.clone().filter(|_| conn.authenticated).unwrap_or_else(|| "<not logged in>".to_string())
        ),
        format!(
            "TYPE: {}",
            match conn.transfer_type {
                TransferType::Ascii => "ASCII",
                TransferType::Binary => "Binary",
            }
        ),
        format!("Transfer in progress: {transfer_busy}"),
        "End of status".to_string(),
    ];
    conn.writer.reply_lines(status::SYSTEM_STATUS, lines).await;
    Ok(())
}
