//! Command handlers, grouped by the part of the protocol they implement.
//!
//! [`dispatch`] covers every command that is neither a special action
//! (`ABOR`, `STAT` with no parameter, `QUIT` — handled inline by
//! [`crate::connection::Connection::run`]) nor transfer-related (`RETR`,
//! `STOR`, `APPE`, `STOU`, `LIST`, `NLST`, `MLSD` — spawned via
//! [`transfer::run`]).

pub mod auth;
pub mod data;
pub mod fsops;
pub mod hash;
pub mod misc;
pub mod site;
pub mod transfer;

use core::error::FtpError;
use core::status;

use crate::connection::Connection;
use crate::writer::ControlWriter;

/// Replies with the FTP code a driver-reported error maps onto, using its
/// sanitized wire message rather than the underlying error's `Display`.
pub(crate) async fn reply_driver_error(writer: &ControlWriter, err: &FtpError) {
    let code = match err.driver_kind() {
        Some(kind) => status::code_for_driver_error(kind),
        None => status::FILE_UNAVAILABLE,
    };
    writer.reply(code, err.wire_message()).await;
}

/// Routes a non-transfer, non-special command to its handler.
///
/// A handler is expected to send its own FTP reply; it returns `Err` only
/// for a failure the generic `500 Error: <msg>` reply in
/// [`crate::connection::Connection::run`] should cover.
pub async fn dispatch(conn: &mut Connection, command: &str, param: &str) -> Result<(), FtpError> {
    match command {
        "USER" => auth::user(conn, param).await,
        "PASS" => auth::pass(conn, param).await,
        "ACCT" => auth::acct(conn, param).await,
        "AUTH" => auth::auth_unsupported_mechanism(conn, param).await,
        "PROT" => auth::prot(conn, param).await,
        "PBSZ" => auth::pbsz(conn, param).await,

        "CWD" | "XCWD" => fsops::cwd(conn, param).await,
        "CDUP" => fsops::cdup(conn).await,
        "PWD" | "XPWD" => fsops::pwd(conn).await,
        "MKD" | "XMKD" => fsops::mkd(conn, param).await,
        "RMD" | "XRMD" => fsops::rmd(conn, param).await,
        "RNFR" => fsops::rnfr(conn, param).await,
        "RNTO" => fsops::rnto(conn, param).await,
        "DELE" => fsops::dele(conn, param).await,
        "SIZE" => fsops::size(conn, param).await,
        "MDTM" => fsops::mdtm(conn, param).await,
        "MFMT" => fsops::mfmt(conn, param).await,
        "MLST" => fsops::mlst(conn, param).await,
        "COMB" => fsops::comb(conn, param).await,

        "REST" => misc::rest(conn, param).await,
        "TYPE" => misc::type_cmd(conn, param).await,
        "MODE" => misc::mode(conn, param).await,
        "STRU" => misc::stru(conn, param).await,
        "NOOP" => misc::noop(conn).await,
        "CLNT" => misc::clnt(conn, param).await,
        "SYST" => misc::syst(conn).await,
        "STAT" => misc::stat_path(conn, param).await,
        "FEAT" => misc::feat(conn).await,
        "OPTS" => misc::opts(conn, param).await,
        "AVBL" => misc::avbl(conn, param).await,
        "ALLO" => misc::allo(conn, param).await,
        "HELP" => misc::help(conn, param).await,

        "PORT" => data::port(conn, param).await,
        "EPRT" => data::eprt(conn, param).await,
        "PASV" => data::pasv(conn).await,
        "EPSV" => data::epsv(conn).await,

        "SITE" => site::site(conn, param).await,

        "HASH" => hash::hash(conn, param).await,
        "XCRC" => hash::legacy(conn, param, "crc32").await,
        "MD5" | "XMD5" => hash::legacy(conn, param, "md5").await,
        "XSHA1" => hash::legacy(conn, param, "sha1").await,
        "XSHA256" => hash::legacy(conn, param, "sha256").await,
        "XSHA512" => hash::legacy(conn, param, "sha512").await,

        other => unreachable!("dispatch called for unhandled command {other}"),
    }
}
