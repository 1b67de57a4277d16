//! `SITE`: the small family of vendor-extension subcommands gated behind
//! the optional `core::driver` capability traits.

use core::error::FtpError;
use core::status;

use crate::connection::Connection;
use crate::handlers::reply_driver_error;

/// Dispatches a `SITE` subcommand. Each arm probes the authenticated
/// filesystem for the matching optional capability and replies `502` if
/// the driver doesn't implement it.
pub async fn site(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if conn.settings().disable_site {
        conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "SITE is disabled").await;
        return Ok(());
    }
    let Some(fs) = conn.filesystem.clone() else {
        conn.writer.reply(status::NOT_LOGGED_IN, "Please login with USER and PASS").await;
        return Ok(());
    };

    let mut parts = param.splitn(2, char::is_whitespace);
    let subcommand = parts.next().unwrap_or("").to_ascii_uppercase();
    let rest = parts.next().unwrap_or("").trim();

    match subcommand.as_str() {
        "CHMOD" => {
            let Some((mode_text, path)) = rest.split_once(' ') else {
                conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "SITE CHMOD requires a mode and a path").await;
                return Ok(());
            };
            let Ok(mode) = u32::from_str_radix(mode_text, 8) else {
                conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "Malformed octal mode").await;
                return Ok(());
            };
            let Some(extension) = fs.as_chmod() else {
                conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "SITE CHMOD not supported").await;
                return Ok(());
            };
            let target = conn.abs_path(path);
            match extension.chmod(&target, mode).await {
                Ok(()) => conn.writer.reply(status::FILE_ACTION_OK, "SITE CHMOD command successful").await,
                Err(err) => reply_driver_error(&conn.writer, &err).await,
            }
        }
        "CHOWN" => {
            let mut fields = rest.split_whitespace();
            let (Some(user), Some(path)) = (fields.next(), fields.next()) else {
                conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "SITE CHOWN requires a user and a path").await;
                return Ok(());
            };
            let Ok(uid) = user.parse::<u32>() else {
                conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "SITE CHOWN expects a numeric uid").await;
                return Ok(());
            };
            let gid = fields.next().and_then(|g| g.parse::<u32>().ok());
            let Some(extension) = fs.as_chown() else {
                conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "SITE CHOWN not supported").await;
                return Ok(());
            };
            let target = conn.abs_path(path);
            match extension.chown(&target, uid, gid).await {
                Ok(()) => conn.writer.reply(status::FILE_ACTION_OK, "SITE CHOWN command successful").await,
                Err(err) => reply_driver_error(&conn.writer, &err).await,
            }
        }
        "SYMLINK" => {
            let Some((link, target)) = rest.split_once(' ') else {
                conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "SITE SYMLINK requires a link and a target").await;
                return Ok(());
            };
            let Some(extension) = fs.as_symlink() else {
                conn.writer.reply(status::COMMAND_NOT_IMPLEMENTED, "SITE SYMLINK not supported").await;
                return Ok(());
            };
            let link_path = conn.abs_path(link);
            let target_path = conn.abs_path(target);
            match extension.symlink(&link_path, &target_path).await {
                Ok(()) => conn.writer.reply(status::FILE_ACTION_OK, "SITE SYMLINK command successful").await,
                Err(err) => reply_driver_error(&conn.writer, &err).await,
            }
        }
        "MKDIR" => {
            if rest.is_empty() {
                conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "SITE MKDIR requires a path").await;
                return Ok(());
            }
            let target = conn.abs_path(rest);
            match fs.mkdir(&target).await {
                Ok(()) => conn.writer.reply(status::FILE_ACTION_OK, "SITE MKDIR command successful").await,
                Err(err) => reply_driver_error(&conn.writer, &err).await,
            }
        }
        "RMDIR" => {
            if rest.is_empty() {
                conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "SITE RMDIR requires a path").await;
                return Ok(());
            }
            let target = conn.abs_path(rest);
            match fs.remove_dir(&target).await {
                Ok(()) => conn.writer.reply(status::FILE_ACTION_OK, "SITE RMDIR command successful").await,
                Err(err) => reply_driver_error(&conn.writer, &err).await,
            }
        }
        "HELP" | "" => {
            conn.writer
                .reply_lines(
                    status::SYSTEM_STATUS,
                    vec![
                        "SITE subcommands:".to_string(),
                        "CHMOD CHOWN SYMLINK MKDIR RMDIR".to_string(),
                        "SITE HELP".to_string(),
                    ],
                )
                .await;
        }
        other => {
            conn.writer
                .reply(status::COMMAND_NOT_IMPLEMENTED_FOR_PARAMETER, format!("SITE {other} not supported"))
                .await;
        }
    }
    Ok(())
}
