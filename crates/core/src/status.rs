//! FTP reply-code constants and the driver-error-kind → code mapping.
//!
//! Codes are grouped the way RFC 959 groups them (1xx preliminary, 2xx
//! success, 3xx pending, 4xx transient failure, 5xx permanent failure) but
//! this module only names the subset this server actually emits.

use crate::error::DriverErrorKind;

/// File status okay; about to open data connection.
pub const FILE_STATUS_OK: u16 = 150;
/// Command okay.
pub const COMMAND_OK: u16 = 200;
/// Command not implemented, superfluous at this site (e.g. `ALLO`).
pub const COMMAND_NOT_IMPLEMENTED_SUPERFLUOUS: u16 = 202;
/// System status / help reply.
pub const SYSTEM_STATUS: u16 = 211;
/// Directory status.
pub const DIRECTORY_STATUS: u16 = 212;
/// File status.
pub const FILE_STATUS: u16 = 213;
/// Help message.
pub const HELP_MESSAGE: u16 = 214;
/// Name system type.
pub const NAME_SYSTEM_TYPE: u16 = 215;
/// Service ready for new user.
pub const SERVICE_READY: u16 = 220;
/// Service closing control connection.
pub const SERVICE_CLOSING: u16 = 221;
/// Data connection open, no transfer in progress.
pub const DATA_CONNECTION_OPEN: u16 = 225;
/// Closing data connection, requested action successful.
pub const CLOSING_DATA_CONNECTION: u16 = 226;
/// Entering passive mode.
pub const ENTERING_PASSIVE_MODE: u16 = 227;
/// Entering extended passive mode.
pub const ENTERING_EXTENDED_PASSIVE_MODE: u16 = 229;
/// User logged in, proceed.
pub const USER_LOGGED_IN: u16 = 230;
/// `AUTH TLS` accepted, proceed with handshake.
pub const AUTH_OK: u16 = 234;
/// Requested file action okay.
pub const FILE_ACTION_OK: u16 = 250;
/// `PWD`/`MKD`/`XPWD`/`XMKD` pathname reply.
pub const PATHNAME_CREATED: u16 = 257;
/// Username okay, need password.
pub const NEED_PASSWORD: u16 = 331;
/// Requested file action pending further information (`RNFR`, `REST`).
pub const FILE_ACTION_PENDING: u16 = 350;
/// Service not available, closing control connection.
pub const SERVICE_NOT_AVAILABLE: u16 = 421;
/// Can't open data connection.
pub const CANT_OPEN_DATA_CONNECTION: u16 = 425;
/// Connection closed; transfer aborted.
pub const CONNECTION_CLOSED_TRANSFER_ABORTED: u16 = 426;
/// Syntax error, command unrecognized.
pub const SYNTAX_ERROR_COMMAND: u16 = 500;
/// Syntax error in parameters or arguments.
pub const SYNTAX_ERROR_PARAMETERS: u16 = 501;
/// Command not implemented.
pub const COMMAND_NOT_IMPLEMENTED: u16 = 502;
/// Bad sequence of commands.
pub const BAD_SEQUENCE: u16 = 503;
/// Command not implemented for that parameter.
pub const COMMAND_NOT_IMPLEMENTED_FOR_PARAMETER: u16 = 504;
/// Not logged in.
pub const NOT_LOGGED_IN: u16 = 530;
/// TLS required.
pub const TLS_REQUIRED: u16 = 521;
/// Requested action not taken; file unavailable.
pub const FILE_UNAVAILABLE: u16 = 550;
/// Requested action aborted; page type unknown.
pub const PAGE_TYPE_UNKNOWN: u16 = 551;
/// Requested file action aborted; exceeded storage allocation (quota).
pub const EXCEEDED_STORAGE_ALLOCATION: u16 = 552;
/// Requested action not taken; filename not allowed.
pub const FILENAME_NOT_ALLOWED: u16 = 553;

/// Maps a driver-reported error kind to the FTP reply code defined for it.
#[must_use]
pub const fn code_for_driver_error(kind: DriverErrorKind) -> u16 {
    match kind {
        DriverErrorKind::QuotaExceeded => EXCEEDED_STORAGE_ALLOCATION,
        DriverErrorKind::FilenameNotAllowed => FILENAME_NOT_ALLOWED,
        DriverErrorKind::PermissionDenied | DriverErrorKind::NotFound => FILE_UNAVAILABLE,
        DriverErrorKind::LocalError => FILE_UNAVAILABLE,
        DriverErrorKind::PageTypeUnknown => PAGE_TYPE_UNKNOWN,
    }
}

/// Returns `true` if `code` is in the 2xx success range.
#[must_use]
pub const fn is_success(code: u16) -> bool {
    code >= 200 && code < 300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_maps_to_552() {
        assert_eq!(
            code_for_driver_error(DriverErrorKind::QuotaExceeded),
            EXCEEDED_STORAGE_ALLOCATION
        );
    }

    #[test]
    fn filename_not_allowed_maps_to_553() {
        assert_eq!(
            code_for_driver_error(DriverErrorKind::FilenameNotAllowed),
            FILENAME_NOT_ALLOWED
        );
    }

    #[test]
    fn not_found_and_permission_denied_map_to_550() {
        assert_eq!(
            code_for_driver_error(DriverErrorKind::NotFound),
            FILE_UNAVAILABLE
        );
        assert_eq!(
            code_for_driver_error(DriverErrorKind::PermissionDenied),
            FILE_UNAVAILABLE
        );
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(is_success(226));
        assert!(!is_success(550));
        assert!(!is_success(150));
    }
}
