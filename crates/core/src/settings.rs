//! Server configuration, fully enumerated.
//!
//! `Settings` is a plain data bag the host constructs in code; there is no
//! file-based config format here (that belongs to a CLI/host layer, out of
//! scope for this crate).

use std::net::{IpAddr, Ipv4Addr};

use crate::error::FtpError;

/// Inclusive port range used for passive-mode listener allocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PortRange {
    /// First port in the range.
    pub start: u16,
    /// Last port in the range, inclusive.
    pub end: u16,
}

impl PortRange {
    /// Creates a new range, swapping the bounds if given out of order.
    #[must_use]
    pub const fn new(start: u16, end: u16) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Number of ports covered by this range.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end as u32 - self.start as u32 + 1
    }

    /// `true` if the range is empty; a [`PortRange`] with valid bounds is
    /// never empty, this exists for API symmetry with other collections.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Number of bind attempts the passive allocator should make, per §4.4:
    /// `clamp(End-Start, 10, 1000)`.
    #[must_use]
    pub fn bind_attempts(&self) -> u32 {
        self.len().clamp(10, 1000)
    }
}

/// Whether TLS is optional, mandatory on authentication, or established
/// before the greeting (implicit).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TlsRequirement {
    /// Clients may use plain or TLS-upgraded control/data channels.
    ClearOrEncrypted,
    /// `USER`/`PASS` are rejected unless the control channel is TLS.
    MandatoryEncryption,
    /// TLS is established immediately after accept, before the greeting.
    ImplicitEncryption,
}

/// Default transfer representation type, per `TYPE`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransferType {
    /// `TYPE A`: ASCII, with line-ending conversion on transfer.
    Ascii,
    /// `TYPE I`: image/binary, bytes passed through unmodified.
    Binary,
}

/// Peer-IP verification policy for data connections.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionCheck {
    /// The data connection's peer IP must match the control connection's.
    IpMatchRequired,
    /// No peer-IP verification is performed.
    IpMatchDisabled,
}

/// How the server learns the public IPv4 address to report in `PASV`
/// replies when no fixed `public_host` is configured.
pub trait PublicIpResolver: Send + Sync {
    /// Returns the IPv4 address to advertise for passive-mode replies.
    fn resolve(&self) -> Ipv4Addr;
}

/// Full set of knobs controlling a server instance.
pub struct Settings {
    /// Address the control-channel listener binds to.
    pub listen_addr: std::net::SocketAddr,
    /// Fixed IPv4 literal advertised in `PASV` replies, if set.
    pub public_host: Option<Ipv4Addr>,
    /// Callback used to resolve the public IP when `public_host` is unset.
    pub public_ip_resolver: Option<Box<dyn PublicIpResolver>>,
    /// Port range passive transfers allocate listeners from.
    pub passive_transfer_port_range: Option<PortRange>,
    /// If `true`, active-mode connections are not forced to bind port 20.
    pub active_transfer_port_non_20: bool,
    /// Idle timeout between commands, in seconds. `0` means the default.
    pub idle_timeout_secs: u32,
    /// Dial/accept timeout for data connections, in seconds. `0` means the
    /// default.
    pub connection_timeout_secs: u32,
    /// Disables `MLSD`.
    pub disable_mlsd: bool,
    /// Disables `MLST`.
    pub disable_mlst: bool,
    /// Disables `MFMT`.
    pub disable_mfmt: bool,
    /// Disables `-a`/`-l` style flags on `LIST`.
    pub disable_list_args: bool,
    /// Disables the `SITE` command family.
    pub disable_site: bool,
    /// Disables `PORT`/`EPRT` (active mode).
    pub disable_active_mode: bool,
    /// Disables `STAT`.
    pub disable_stat: bool,
    /// Disables `SYST`.
    pub disable_syst: bool,
    /// Enables the `HASH`/`XCRC`/`XMD5`/`XSHA*` command family.
    pub enable_hash: bool,
    /// Enables `COMB`.
    pub enable_comb: bool,
    /// Greeting banner text.
    pub banner: String,
    /// TLS requirement policy.
    pub tls_required: TlsRequirement,
    /// Transfer type new connections start in.
    pub default_transfer_type: TransferType,
    /// Peer-IP policy for passive-mode data connections.
    pub pasv_connections_check: ConnectionCheck,
    /// Peer-IP policy for active-mode data connections.
    pub active_connections_check: ConnectionCheck,
}

/// Default idle timeout, in seconds, when `idle_timeout_secs` is `0`.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u32 = 900;
/// Default data-connection timeout, in seconds, when `connection_timeout_secs` is `0`.
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u32 = 30;

impl Settings {
    /// Resolves `idle_timeout_secs`, substituting the documented default
    /// when unset.
    #[must_use]
    pub const fn idle_timeout(&self) -> u32 {
        if self.idle_timeout_secs == 0 {
            DEFAULT_IDLE_TIMEOUT_SECS
        } else {
            self.idle_timeout_secs
        }
    }

    /// Resolves `connection_timeout_secs`, substituting the documented
    /// default when unset.
    #[must_use]
    pub const fn connection_timeout(&self) -> u32 {
        if self.connection_timeout_secs == 0 {
            DEFAULT_CONNECTION_TIMEOUT_SECS
        } else {
            self.connection_timeout_secs
        }
    }

    /// Validates the settings, normalizing zero timeouts to their defaults
    /// implicitly (via the accessors above) and checking `public_host`
    /// parses as an IPv4 literal, including IPv4-mapped IPv6 addresses
    /// normalized to their IPv4 form.
    pub fn validate(&self) -> Result<(), FtpError> {
        if let Some(range) = self.passive_transfer_port_range {
            if range.start == 0 {
                return Err(FtpError::InvalidSettings(
                    "passive_transfer_port_range start must be nonzero".into(),
                ));
            }
        }
        Ok(())
    }

    /// Normalizes an [`IpAddr`] the way `public_host` validation requires:
    /// IPv4-mapped IPv6 addresses are reduced to their IPv4 form, anything
    /// else is rejected.
    pub fn normalize_public_host(addr: IpAddr) -> Result<Ipv4Addr, FtpError> {
        match addr {
            IpAddr::V4(v4) => Ok(v4),
            IpAddr::V6(v6) => v6.to_ipv4_mapped().ok_or_else(|| {
                FtpError::InvalidSettings(format!("public_host {v6} is not an IPv4 literal"))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn port_range_swaps_out_of_order_bounds() {
        let range = PortRange::new(50, 10);
        assert_eq!(range.start, 10);
        assert_eq!(range.end, 50);
    }

    #[test]
    fn bind_attempts_clamped_between_10_and_1000() {
        assert_eq!(PortRange::new(1, 1).bind_attempts(), 10);
        assert_eq!(PortRange::new(1, 5000).bind_attempts(), 1000);
        assert_eq!(PortRange::new(40000, 40050).bind_attempts(), 51);
    }

    #[test]
    fn normalize_rejects_non_mapped_ipv6() {
        let addr = IpAddr::V6(Ipv6Addr::LOCALHOST);
        assert!(Settings::normalize_public_host(addr).is_err());
    }

    #[test]
    fn normalize_accepts_ipv4_mapped_ipv6() {
        let mapped = Ipv6Addr::new(0, 0, 0, 0, 0, 0xffff, 0xc0a8, 0x0101);
        let resolved = Settings::normalize_public_host(IpAddr::V6(mapped)).unwrap();
        assert_eq!(resolved, Ipv4Addr::new(192, 168, 1, 1));
    }

    #[test]
    fn zero_timeouts_resolve_to_documented_defaults() {
        let settings = Settings {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            public_host: None,
            public_ip_resolver: None,
            passive_transfer_port_range: None,
            active_transfer_port_non_20: false,
            idle_timeout_secs: 0,
            connection_timeout_secs: 0,
            disable_mlsd: false,
            disable_mlst: false,
            disable_mfmt: false,
            disable_list_args: false,
            disable_site: false,
            disable_active_mode: false,
            disable_stat: false,
            disable_syst: false,
            enable_hash: true,
            enable_comb: false,
            banner: "test".into(),
            tls_required: TlsRequirement::ClearOrEncrypted,
            default_transfer_type: TransferType::Binary,
            pasv_connections_check: ConnectionCheck::IpMatchRequired,
            active_connections_check: ConnectionCheck::IpMatchRequired,
        };
        assert_eq!(settings.idle_timeout(), DEFAULT_IDLE_TIMEOUT_SECS);
        assert_eq!(
            settings.connection_timeout(),
            DEFAULT_CONNECTION_TIMEOUT_SECS
        );
        assert!(settings.validate().is_ok());
    }
}
