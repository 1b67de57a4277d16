//! Static registry of the FTP commands this server understands.
//!
//! The daemon consults [`lookup`] before dispatch to decide whether a
//! command is reachable pre-authentication, whether it opens a data
//! connection, and whether it is one of the few commands (`ABOR`, `STAT`,
//! `QUIT`) that must be actable even while a transfer is in flight on
//! another task.

/// Static facts about one command verb, looked up by name before dispatch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommandDescriptor {
    /// The upper-case command verb, e.g. `"RETR"`.
    pub name: &'static str,
    /// Whether this command may run before `USER`/`PASS` authentication
    /// has completed.
    pub open_to_unauth: bool,
    /// Whether handling this command opens or uses a data connection.
    pub transfer_related: bool,
    /// Whether this command must be actable out-of-band while another
    /// command (usually a transfer) is in progress on the same session.
    pub special_action: bool,
}

const fn cmd(name: &'static str, open_to_unauth: bool, transfer_related: bool, special_action: bool) -> CommandDescriptor {
    CommandDescriptor {
        name,
        open_to_unauth,
        transfer_related,
        special_action,
    }
}

/// The full set of commands this server recognizes, in no particular order.
static COMMANDS: &[CommandDescriptor] = &[
    cmd("USER", true, false, false),
    cmd("PASS", true, false, false),
    cmd("ACCT", true, false, false),
    cmd("CWD", false, false, false),
    cmd("XCWD", false, false, false),
    cmd("CDUP", false, false, false),
    cmd("PWD", false, false, false),
    cmd("XPWD", false, false, false),
    cmd("MKD", false, false, false),
    cmd("XMKD", false, false, false),
    cmd("RMD", false, false, false),
    cmd("XRMD", false, false, false),
    cmd("RNFR", false, false, false),
    cmd("RNTO", false, false, false),
    cmd("DELE", false, false, false),
    cmd("SIZE", false, false, false),
    cmd("MDTM", false, false, false),
    cmd("MFMT", false, false, false),
    cmd("LIST", false, true, false),
    cmd("NLST", false, true, false),
    cmd("MLSD", false, true, false),
    cmd("MLST", false, false, false),
    cmd("RETR", false, true, false),
    cmd("STOR", false, true, false),
    cmd("APPE", false, true, false),
    cmd("STOU", false, true, false),
    cmd("COMB", false, false, false),
    cmd("REST", false, false, false),
    cmd("TYPE", false, false, false),
    cmd("MODE", false, false, false),
    cmd("STRU", false, false, false),
    cmd("SITE", false, false, false),
    cmd("HASH", false, false, false),
    cmd("XCRC", false, false, false),
    cmd("MD5", false, false, false),
    cmd("XMD5", false, false, false),
    cmd("XSHA1", false, false, false),
    cmd("XSHA256", false, false, false),
    cmd("XSHA512", false, false, false),
    cmd("AVBL", false, false, false),
    cmd("FEAT", true, false, false),
    cmd("OPTS", true, false, false),
    cmd("AUTH", true, false, false),
    cmd("PROT", true, false, false),
    cmd("PBSZ", true, false, false),
    cmd("NOOP", true, false, false),
    cmd("CLNT", true, false, false),
    cmd("SYST", true, false, false),
    cmd("STAT", true, false, true),
    cmd("QUIT", true, false, true),
    cmd("ABOR", true, false, true),
    cmd("PORT", false, false, false),
    cmd("EPRT", false, false, false),
    cmd("PASV", false, false, false),
    cmd("EPSV", false, false, false),
    cmd("HELP", true, false, false),
    cmd("ALLO", false, false, false),
];

/// Looks up the descriptor for `name`, matching case-insensitively.
///
/// Returns `None` for any verb not in the supported command set, which the
/// daemon reports back to the client as `502 Command not implemented`.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static CommandDescriptor> {
    let upper = name.to_ascii_uppercase();
    COMMANDS.iter().find(|descriptor| descriptor.name == upper)
}
