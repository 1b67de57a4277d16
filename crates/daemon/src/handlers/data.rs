//! `PORT`/`EPRT` (active mode) and `PASV`/`EPSV` (passive mode): composing
//! and installing a [`transport::TransferHandler`] without opening it.
//!
//! Opening happens lazily, on the first transfer-related command, inside
//! [`crate::handlers::transfer`].

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use core::error::FtpError;
use core::settings::ConnectionCheck;
use core::status;
use transport::portrange::bind_passive_listener;
use transport::{ActiveTransferHandler, PassiveTransferHandler, TlsAcceptor};

use crate::connection::Connection;

fn connection_timeout(conn: &Connection) -> Duration {
    Duration::from_secs(u64::from(conn.settings().connection_timeout()))
}

fn transfer_tls_acceptor(conn: &Connection) -> Option<TlsAcceptor> {
    if !conn.transfer_tls {
        return None;
    }
    conn.tls_provider.as_ref().map(|provider| TlsAcceptor::new(provider.server_config()))
}

/// `PORT h1,h2,h3,h4,p1,p2`.
pub async fn port(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if conn.settings().disable_active_mode {
        conn.writer.reply(status::SERVICE_NOT_AVAILABLE, "PORT command is disabled").await;
        return Ok(());
    }
    let Some(addr) = parse_port_addr(param) else {
        conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "Malformed PORT address").await;
        return Ok(());
    };
    install_active(conn, addr, "PORT").await;
    Ok(())
}

/// `EPRT |proto|addr|port|`.
pub async fn eprt(conn: &mut Connection, param: &str) -> Result<(), FtpError> {
    if conn.settings().disable_active_mode {
        conn.writer.reply(status::SERVICE_NOT_AVAILABLE, "EPRT command is disabled").await;
        return Ok(());
    }
    let Some(addr) = parse_eprt_addr(param) else {
        conn.writer.reply(status::SYNTAX_ERROR_PARAMETERS, "Malformed EPRT address").await;
        return Ok(());
    };
    install_active(conn, addr, "EPRT").await;
    Ok(())
}

async fn install_active(conn: &mut Connection, addr: SocketAddr, cmd: &str) {
    if matches!(conn.settings().active_connections_check, ConnectionCheck::IpMatchRequired)
        && addr.ip() != conn.remote_addr().ip()
    {
        conn.writer
            .reply(status::SYNTAX_ERROR_PARAMETERS, "Your request does not meet the configured security requirements")
            .await;
        return;
    }

    let handler = ActiveTransferHandler::new(
        addr,
        connection_timeout(conn),
        conn.settings().active_transfer_port_non_20,
        transfer_tls_acceptor(conn),
    );
    conn.transfer.lock().await.install(Box::new(handler));
    conn.writer.reply(status::COMMAND_OK, format!("{cmd} command successful")).await;
}

/// `PASV`: binds a listener and replies with the dotted-quad/port pair.
pub async fn pasv(conn: &mut Connection) -> Result<(), FtpError> {
    let local_ip = match conn.settings().listen_addr.ip() {
        IpAddr::V4(v4) => IpAddr::V4(v4),
        IpAddr::V6(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    };
    let Ok(listener) = bind_passive_listener(local_ip, conn.settings().passive_transfer_port_range).await else {
        conn.writer.reply(status::SERVICE_NOT_AVAILABLE, "could not find any port").await;
        return Ok(());
    };
    let Ok(bound_addr) = listener.local_addr() else {
        conn.writer.reply(status::SERVICE_NOT_AVAILABLE, "could not find any port").await;
        return Ok(());
    };

    let public_ip = resolve_public_ip(conn);
    let handler = PassiveTransferHandler::new(
        listener,
        connection_timeout(conn),
        conn.settings().pasv_connections_check,
        conn.remote_addr().ip(),
        transfer_tls_acceptor(conn),
    );
    conn.transfer.lock().await.install(Box::new(handler));

    let octets = public_ip.octets();
    let port = bound_addr.port();
    conn.writer
        .reply(
            status::ENTERING_PASSIVE_MODE,
            format!(
                "Entering Passive Mode ({},{},{},{},{},{})",
                octets[0],
                octets[1],
                octets[2],
                octets[3],
                port >> 8,
                port & 0xff
            ),
        )
        .await;
    Ok(())
}

/// `EPSV`.
pub async fn epsv(conn: &mut Connection) -> Result<(), FtpError> {
    let local_ip = conn.settings().listen_addr.ip();
    let Ok(listener) = bind_passive_listener(local_ip, conn.settings().passive_transfer_port_range).await else {
        conn.writer.reply(status::SERVICE_NOT_AVAILABLE, "could not find any port").await;
        return Ok(());
    };
    let Ok(bound_addr) = listener.local_addr() else {
        conn.writer.reply(status::SERVICE_NOT_AVAILABLE, "could not find any port").await;
        return Ok(());
    };

    let handler = PassiveTransferHandler::new(
        listener,
        connection_timeout(conn),
        conn.settings().pasv_connections_check,
        conn.remote_addr().ip(),
        transfer_tls_acceptor(conn),
    );
    conn.transfer.lock().await.install(Box::new(handler));

    conn.writer
        .reply(
            status::ENTERING_EXTENDED_PASSIVE_MODE,
            format!("Entering Extended Passive Mode (|||{}|)", bound_addr.port()),
        )
        .await;
    Ok(())
}

fn resolve_public_ip(conn: &Connection) -> Ipv4Addr {
    if let Some(host) = conn.settings().public_host {
        return host;
    }
    if let Some(resolver) = &conn.settings().public_ip_resolver {
        return resolver.resolve();
    }
    match conn.settings().listen_addr.ip() {
        IpAddr::V4(v4) => v4,
        IpAddr::V6(v6) => v6.to_ipv4_mapped().unwrap_or(Ipv4Addr::UNSPECIFIED),
    }
}

fn parse_port_addr(param: &str) -> Option<SocketAddr> {
    let parts: Vec<&str> = param.split(',').collect();
    if parts.len() != 6 {
        return None;
    }
    let octets: Vec<u8> = parts[..4].iter().map(|p| p.parse().ok()).collect::<Option<_>>()?;
    let p1: u16 = parts[4].parse().ok()?;
    let p2: u16 = parts[5].parse().ok()?;
    let port = p1.checked_mul(256)?.checked_add(p2)?;
    if port == 0 {
        return None;
    }
    Some(SocketAddr::new(
        IpAddr::V4(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3])),
        port,
    ))
}

fn parse_eprt_addr(param: &str) -> Option<SocketAddr> {
    let trimmed = param.trim();
    let delim = trimmed.chars().next()?;
    let fields: Vec<&str> = trimmed.trim_matches(delim).split(delim).collect();
    if fields.len() != 3 {
        return None;
    }
    let proto = fields[0];
    let addr_text = fields[1];
    let port: u16 = fields[2].parse().ok()?;
    if port == 0 {
        return None;
    }
    let ip = match proto {
        "1" => IpAddr::V4(addr_text.parse::<Ipv4Addr>().ok()?),
        "2" => IpAddr::V6(addr_text.parse::<Ipv6Addr>().ok()?),
        _ => return None,
    };
    Some(SocketAddr::new(ip, port))
}
