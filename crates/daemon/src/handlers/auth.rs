//! `USER`/`PASS`/`ACCT`, and the TLS-adjacent `AUTH`/`PROT`/`PBSZ` trio.
//!
//! `AUTH TLS` itself is handled inline by [`crate::connection::Connection`]
//! since it has to rebuild the control channel's reader/writer halves; this
//! module only answers `AUTH` requests for mechanisms other than `TLS`.

use core::error::FtpError;
use core::status;

use crate::connection::Connection;

/// Records the username and enforces TLS-before-login when the driver
/// requires it (the mandatory-encryption case is intercepted earlier, in
/// the dispatch loop, and never reaches here).
pub async fn user(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if param.is_empty() {
        conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "Username required").await;
        return Ok(());
    }
    conn.pending_user = Some(param.to_string());
    conn.authenticated = false;
    conn.writer.reply(status::NEED_PASSWORD, "Please specify the password").await;
    Ok(())
}

/// Calls the driver's `authenticate`; success installs the returned
/// filesystem and replies `230`, failure replies `530`.
pub async fn pass(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    let Some(username) = conn.pending_user.clone() else {
        conn.writer.reply(status::BAD_SEQUENCE, "Login with USER first").await;
        return Ok(());
    };

    let ctx = conn.driver_context();
    match conn.driver.authenticate(&ctx, &username, param).await {
        Ok(filesystem) => {
            conn.filesystem = Some(std::sync::Arc::from(filesystem));
            conn.authenticated = true;
            conn.writer.reply(status::USER_LOGGED_IN, "Login successful").await;
        }
        Err(_) => {
            conn.authenticated = false;
            conn.pending_user = None;
            conn.writer.reply(status::NOT_LOGGED_IN, "Login incorrect").await;
        }
    }
    Ok(())
}

/// `ACCT` is accepted syntactically but this core has no account concept
/// beyond `USER`/`PASS`.
pub async fn acct(conn: &mut Connection, _param: &str) -> Result<(), FtpError> {
    conn.writer.reply(status::COMMAND_OK, "ACCT command superfluous").await;
    Ok(())
}

/// Any `AUTH` mechanism other than `TLS` (handled inline) is unsupported.
pub async fn auth_unsupported_mechanism(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    conn.writer
        .reply(status::COMMAND_NOT_IMPLEMENTED_FOR_PARAMETER, format!("AUTH {param} not supported"))
        .await;
    Ok(())
}

/// `PROT P` turns on transfer TLS, `PROT C` turns it off.
pub async fn prot(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    match param.trim().to_ascii_uppercase().as_str() {
        "P" => {
            conn.transfer_tls = true;
            conn.writer.reply(status::COMMAND_OK, "Protection set to Private").await;
        }
        "C" => {
            conn.transfer_tls = false;
            conn.writer.reply(status::COMMAND_OK, "Protection set to Clear").await;
        }
        _ => {
            conn.writer
                .reply(status::COMMAND_NOT_IMPLEMENTED_FOR_PARAMETER, "Unsupported protection level")
                .await;
        }
    }
    Ok(())
}

/// `PBSZ` is accepted and ignored, per §4.5.
pub async fn pbsz(conn: &mut Connection, _param: &str) -> Result<(), FtpError> {
    conn.writer.reply(status::COMMAND_OK, "PBSZ command successful").await;
    Ok(())
}
