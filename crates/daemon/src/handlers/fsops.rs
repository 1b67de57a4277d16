//! Path-facing commands: navigation, directory/file mutation, inquiry.

use core::error::FtpError;
use core::settings::TransferType;
use core::status;

use crate::connection::Connection;
use crate::handlers::reply_driver_error;
use crate::path::quote_path;
use crate::timefmt;

fn filesystem(conn: &Connection) -> Option<std::sync::Arc<dyn core::driver::FileSystem>> {
    conn.filesystem.clone()
}

/// `CWD`/`XCWD`: verifies the target is a directory before adopting it.
pub async fn cwd(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let Some(fs) = filesystem(conn) else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);
    match fs.stat(&target).await {
        Ok(meta) if meta.is_dir() => {
            conn.current_path = target.to_string_lossy().into_owned();
            conn.writer
                .reply(status::FILE_ACTION_OK, format!("directory changed to {}", quote_path(&target)))
                .await;
        }
        Ok(_) => {
            conn.writer.reply(status::FILE_UNAVAILABLE, "Not a directory").await;
        }
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `CDUP`: `CWD ..`.
pub async fn cdup(conn: &mut Connection) -> Result<(), FtpError> {
    cwd(conn, "..").await
}

/// `PWD`/`XPWD`.
pub async fn pwd(conn: &mut Connection) -> Result<(), FtpError> {
    let path = conn.current_path.clone();
    conn.writer
        .reply(
            status::PATHNAME_CREATED,
            format!("{} is the current directory", quote_path(std::path::Path::new(&path))),
        )
        .await;
    Ok(())
}

/// `MKD`/`XMKD`.
pub async fn mkd(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let Some(fs) = filesystem(conn) else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);
    match fs.mkdir(&target).await {
        Ok(()) => {
            conn.writer
                .reply(status::PATHNAME_CREATED, format!("{} created", quote_path(&target)))
                .await;
        }
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `RMD`/`XRMD`.
pub async fn rmd(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let Some(fs) = filesystem(conn) else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);
    match fs.remove_dir(&target).await {
        Ok(()) => conn.writer.reply(status::FILE_ACTION_OK, "Directory removed").await,
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `RNFR`: stats the source so `RNTO` has something to rename.
pub async fn rnfr(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let Some(fs) = filesystem(conn) else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);
    match fs.stat(&target).await {
        Ok(_) => {
            conn.rename_from = Some(target);
            conn.writer
                .reply(status::FILE_ACTION_PENDING, "File exists, ready for destination name")
                .await;
        }
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `RNTO`: completes a pending `RNFR`.
pub async fn rnto(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let Some(source) = conn.rename_from.take() else {
        conn.writer.reply(status::BAD_SEQUENCE, "RNFR required first").await;
        return Ok(());
    };
    let Some(fs) = filesystem(conn) else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);
    match fs.rename(&source, &target).await {
        Ok(()) => conn.writer.reply(status::FILE_ACTION_OK, "Rename successful").await,
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `DELE`.
pub async fn dele(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let Some(fs) = filesystem(conn) else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);
    match fs.remove_file(&target).await {
        Ok(()) => conn.writer.reply(status::FILE_ACTION_OK, "File removed").await,
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `SIZE`: refused in ASCII mode, since the byte count on the wire would not
/// match the reported size once line endings are converted.
pub async fn size(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if matches!(conn.transfer_type, TransferType::Ascii) {
        conn.writer.reply(status::FILE_UNAVAILABLE, "SIZE not allowed in ASCII mode").await;
        return Ok(());
    }
    let Some(fs) = filesystem(conn) else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);
    match fs.stat(&target).await {
        Ok(meta) => conn.writer.reply(status::FILE_STATUS, meta.len().to_string()).await,
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `MDTM`.
pub async fn mdtm(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let Some(fs) = filesystem(conn) else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);
    match fs.stat(&target).await {
        Ok(meta) => match meta.modified() {
            Ok(time) => conn.writer.reply(status::FILE_STATUS, timefmt::format_utc(time)).await,
            Err(err) => conn.writer.reply(status::FILE_UNAVAILABLE, err.to_string()).await,
        },
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `MFMT <timestamp> <path>`: sets a modification time.
pub async fn mfmt(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if conn.settings().disable_mfmt {
        conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "MFMT is disabled").await;
        return Ok(());
    }
    let Some((stamp, path)) = param.split_once(' ') else {
        conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "MFMT requires a timestamp and a path").await;
        return Ok(());
    };
    let Some(time) = timefmt::parse_utc(stamp) else {
        conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "Malformed timestamp").await;
        return Ok(());
    };
    let Some(fs) = filesystem(conn) else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(path);
    match fs.set_modified(&target, time).await {
        Ok(()) => {
            conn.writer
                .reply(status::FILE_STATUS, format!("Modify={stamp}; {}", quote_path(&target)))
                .await;
        }
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `MLST`: a single-entry machine-readable listing, formatted the same as
/// one `MLSD` line but returned as a multi-line reply body.
pub async fn mlst(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if conn.settings().disable_mlst {
        conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "MLST is disabled").await;
        return Ok(());
    }
    let Some(fs) = filesystem(conn) else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };
    let target = conn.abs_path(param);
    match fs.stat(&target).await {
        Ok(meta) => {
            let name = target.file_name().and_then(|n| n.to_str()).unwrap_or("/");
            let line = crate::handlers::transfer::format_mlsd_entry(meta.as_ref(), name);
            conn.writer
                .reply_lines(status::DIRECTORY_STATUS, vec!["Listing".to_string(), line, "End".to_string()])
                .await;
        }
        Err(err) => reply_driver_error(&conn.writer, &err).await,
    }
    Ok(())
}

/// `COMB <dest> <src1> [src2 ...]`: concatenates sources into `dest`.
pub async fn comb(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if !conn.settings().enable_comb {
        conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "COMB is disabled").await;
        return Ok(());
    }
    let mut parts = param.split_whitespace();
    let Some(dest) = parts.next() else {
        conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "COMB requires a destination and sources").await;
        return Ok(());
    };
    let sources: Vec<&str> = parts.collect();
    if sources.is_empty() {
        conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "COMB requires at least one source").await;
        return Ok(());
    }
    let Some(fs) = filesystem(conn) else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };

    let dest_path = conn.abs_path(dest);
    let mut writer = match fs.open_write(&dest_path, false).await {
        Ok(handle) => handle,
        Err(err) => {
            reply_driver_error(&conn.writer, &err).await;
            return Ok(());
        }
    };

    for source in sources {
        let source_path = conn.abs_path(source);
        let mut reader = match fs.open_read(&source_path).await {
            Ok(handle) => handle,
            Err(err) => {
                reply_driver_error(&conn.writer, &err).await;
                return Ok(());
            }
        };
        if let Err(err) = tokio::io::copy(&mut reader, &mut writer).await {
            conn.writer.reply(status::FILE_UNAVAILABLE, err.to_string()).await;
            return Ok(());
        }
    }
    conn.writer.reply(status::FILE_ACTION_OK, "COMB successful").await;
    Ok(())
}
